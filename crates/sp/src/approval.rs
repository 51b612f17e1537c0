use async_trait::async_trait;
use stowage_api::{ApprovalProvider, ClientError, RemoteError, RemoteErrorKind, StorageProviderInfo};
use stowage_auth::UnsignedRequest;
use stowage_primitives::constants::{ADMIN_URL_PREFIX, HEADER_SIGNED_MSG, HEADER_UNSIGNED_MSG};
use stowage_tx::{ApprovalAction, ApprovalToken, TxMessage};
use tracing::debug;

use crate::{ErrorContext, SpClient, endpoint::parse_endpoint};

/// Requests approvals from the provider that will serve the resource.
#[derive(Debug, Clone)]
pub struct SpApprovalClient {
    sp: SpClient,
}

impl SpApprovalClient {
    pub fn new(sp: SpClient) -> Self {
        Self { sp }
    }
}

#[async_trait]
impl ApprovalProvider for SpApprovalClient {
    async fn request_approval(
        &self,
        sp: &StorageProviderInfo,
        msg: &TxMessage,
    ) -> Result<ApprovalToken, ClientError> {
        let endpoint = parse_endpoint(&sp.endpoint)?;
        let req = approval_request(msg)?;
        debug!(sp = sp.id, kind = msg.kind(), "requesting approval");

        let resp = self.sp.send(&endpoint, req, None, &ErrorContext::none()).await?;
        let status = resp.status().as_u16();
        let signed = resp
            .headers()
            .get(HEADER_SIGNED_MSG)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| bad_approval(status, "response carries no signed message"))?;
        token_from_header(status, signed)
    }
}

/// `GET /greenfield/admin/v1/get-approval?action=...` carrying the unsigned message.
pub(crate) fn approval_request(msg: &TxMessage) -> Result<UnsignedRequest, ClientError> {
    let action = ApprovalAction::for_message(msg)
        .ok_or_else(|| ClientError::InvalidArgument(format!("{} needs no approval", msg.kind())))?;
    let json = serde_json::to_vec(msg).map_err(|e| ClientError::InvalidArgument(e.to_string()))?;
    Ok(UnsignedRequest::new("GET", format!("{ADMIN_URL_PREFIX}/get-approval"))
        .query("action", action.as_ref())
        .header(HEADER_UNSIGNED_MSG, hex::encode(json)))
}

fn token_from_header(status: u16, value: &str) -> Result<ApprovalToken, ClientError> {
    let bytes = hex::decode(value.trim()).map_err(|e| bad_approval(status, &e.to_string()))?;
    let signed: TxMessage = serde_json::from_slice(&bytes).map_err(|e| bad_approval(status, &e.to_string()))?;
    ApprovalToken::from_signed_message(&signed).map_err(|e| bad_approval(status, &e.to_string()))
}

fn bad_approval(status: u16, reason: &str) -> ClientError {
    RemoteError {
        status,
        kind: RemoteErrorKind::Unknown,
        code: "InvalidApproval".into(),
        message: reason.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};
    use alloy_signer_local::PrivateKeySigner;
    use assert_matches::assert_matches;
    use stowage_tx::{CreateBucketOptions, MessageBuilder};

    fn create_bucket() -> TxMessage {
        let sender = PrivateKeySigner::random().address();
        MessageBuilder::new(sender)
            .create_bucket("photos", &Address::repeat_byte(0x51).to_string(), &CreateBucketOptions::default())
            .unwrap()
            .remove(0)
    }

    #[test]
    fn request_carries_hex_json_message() {
        let msg = create_bucket();
        let req = approval_request(&msg).unwrap();
        assert_eq!(req.path, "/greenfield/admin/v1/get-approval");
        assert_eq!(req.query, vec![("action".to_string(), "CreateBucket".to_string())]);

        let (_, unsigned) = req.headers.iter().find(|(k, _)| k == HEADER_UNSIGNED_MSG).unwrap();
        let decoded: TxMessage = serde_json::from_slice(&hex::decode(unsigned).unwrap()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn transfers_need_no_approval() {
        let sender = PrivateKeySigner::random().address();
        let msg = MessageBuilder::new(sender)
            .transfer(&Address::repeat_byte(2).to_string(), U256::from(10u64))
            .unwrap()
            .remove(0);
        assert_matches!(approval_request(&msg), Err(ClientError::InvalidArgument(_)));
    }

    #[test]
    fn signed_header_becomes_a_token() {
        let key = PrivateKeySigner::random();
        let mut msg = create_bucket();
        ApprovalToken::issue(&key, &msg, 10, 7).unwrap().attach(&mut msg).unwrap();
        let header = hex::encode(serde_json::to_vec(&msg).unwrap());

        let token = token_from_header(200, &header).unwrap();
        assert_eq!(token.family_id(), 7);
        token.verify_issuer(key.address()).unwrap();
    }

    #[test]
    fn unsigned_echo_is_rejected() {
        let header = hex::encode(serde_json::to_vec(&create_bucket()).unwrap());
        let err = token_from_header(200, &header).unwrap_err();
        assert_matches!(err, ClientError::Remote(RemoteError { code, .. }) if code == "InvalidApproval");
    }
}
