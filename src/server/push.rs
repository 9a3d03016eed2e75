//! Push-notification dispatcher — signed out-of-band delivery of final task
//! state to a caller-supplied URL.
//!
//! Signing uses a per-process 2048-bit RSA keypair generated at startup. The
//! public half is served at `/.well-known/jwks.json` as a single-entry JWKS
//! so receivers can validate the short-lived RS256 bearer token attached to
//! every delivery.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{A2AError, A2AResult};
use crate::types::{PushNotificationConfig, Task};

/// Token lifetime; receivers should reject anything older.
const TOKEN_TTL_SECS: i64 = 300;

/// Header carrying the config's opaque verification token, when present.
pub const NOTIFICATION_TOKEN_HEADER: &str = "X-A2A-Notification-Token";

/// JWT claims attached to every push delivery.
#[derive(Debug, Serialize, Deserialize)]
pub struct PushClaims {
    /// Issuing agent name.
    pub iss: String,
    /// Task id the delivery is about.
    pub sub: String,
    /// Issued-at (seconds since epoch).
    pub iat: i64,
    /// Expiry (seconds since epoch).
    pub exp: i64,
}

/// Signs and delivers terminal task snapshots.
pub struct PushNotifier {
    issuer: String,
    kid: String,
    encoding_key: EncodingKey,
    public_key: RsaPublicKey,
    client: reqwest::Client,
}

impl PushNotifier {
    /// Generate a fresh per-process keypair for the given issuing agent.
    pub fn new(issuer: impl Into<String>) -> A2AResult<Self> {
        let mut rng = rand::rngs::OsRng;
        let private_key = RsaPrivateKey::new(&mut rng, 2048)
            .map_err(|e| A2AError::internal_error(format!("RSA key generation failed: {e}")))?;
        let public_key = private_key.to_public_key();

        let der = private_key
            .to_pkcs1_der()
            .map_err(|e| A2AError::internal_error(format!("RSA key encoding failed: {e}")))?;
        let encoding_key = EncodingKey::from_rsa_der(der.as_bytes());

        Ok(Self {
            issuer: issuer.into(),
            kid: Uuid::new_v4().to_string(),
            encoding_key,
            public_key,
            client: reqwest::Client::new(),
        })
    }

    /// The JWKS document served at `/.well-known/jwks.json`.
    pub fn jwks(&self) -> serde_json::Value {
        let n = URL_SAFE_NO_PAD.encode(self.public_key.n().to_bytes_be());
        let e = URL_SAFE_NO_PAD.encode(self.public_key.e().to_bytes_be());
        serde_json::json!({
            "keys": [{
                "kty": "RSA",
                "kid": self.kid,
                "alg": "RS256",
                "use": "sig",
                "n": n,
                "e": e,
            }]
        })
    }

    /// Key id of the signing key.
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// HEAD-probe a push URL before a config referencing it is accepted.
    pub async fn verify_url(&self, url: &str) -> A2AResult<()> {
        let resp = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| A2AError::Transport(format!("push URL unreachable: {e}")))?;
        if resp.status().is_success() || resp.status().as_u16() == 405 {
            // Some receivers only implement POST; a 405 still proves liveness.
            Ok(())
        } else {
            Err(A2AError::Http {
                status: resp.status().as_u16(),
                body: format!("push URL verification returned {}", resp.status()),
            })
        }
    }

    /// Mint the bearer token for a delivery about `task_id`.
    fn sign(&self, task_id: &str) -> A2AResult<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = PushClaims {
            iss: self.issuer.clone(),
            sub: task_id.to_string(),
            iat: now,
            exp: now + TOKEN_TTL_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.kid.clone());
        jsonwebtoken::encode(&header, &claims, &self.encoding_key)
            .map_err(|e| A2AError::internal_error(format!("push token signing failed: {e}")))
    }

    /// POST the serialized task to the configured URL with a signed token.
    pub async fn notify(&self, config: &PushNotificationConfig, task: &Task) -> A2AResult<()> {
        let token = self.sign(&task.id)?;

        let mut request = self
            .client
            .post(&config.url)
            .bearer_auth(token)
            .json(task);
        if let Some(ref verification) = config.token {
            request = request.header(NOTIFICATION_TOKEN_HEADER, verification);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| A2AError::Transport(format!("push delivery failed: {e}")))?;

        if resp.status().is_success() {
            debug!(task_id = %task.id, url = %config.url, "push notification delivered");
            Ok(())
        } else {
            warn!(
                task_id = %task.id,
                url = %config.url,
                status = resp.status().as_u16(),
                "push endpoint rejected delivery"
            );
            Err(A2AError::Http {
                status: resp.status().as_u16(),
                body: resp.text().await.unwrap_or_default(),
            })
        }
    }
}
