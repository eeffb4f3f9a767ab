use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::db::{ACCESS_TOKEN_KEY, Database, REFRESH_TOKEN_KEY};
use crate::error::{ClientError, ClientResult};
use crate::http::HttpClient;

pub(crate) const VERIFY_PATH: &str = "/api/v0/user/verify-access-token";
pub(crate) const REFRESH_PATH: &str = "/api/v0/user/refresh-access-token";
pub(crate) const EXISTING_USER_PATH: &str = "/api/v1/user/existingUser";
pub(crate) const LOGIN_PATH: &str = "/api/v1/user/login";

const LOGIN_ACTION: &str = "login";
const ID_VERIFICATION_SRC: &str = "OTPLESS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Credentials {
    pub(crate) access_token: String,
    pub(crate) refresh_token: String,
}

/// Persisted bearer token pair. Every `set` is committed before it returns.
pub(crate) struct TokenStore {
    db: Database,
}

impl TokenStore {
    pub(crate) fn new(db: Database) -> Self {
        Self { db }
    }

    pub(crate) fn database(&self) -> &Database {
        &self.db
    }

    pub(crate) fn get(&self) -> ClientResult<Option<Credentials>> {
        let access_token = self.db.credential(ACCESS_TOKEN_KEY)?.unwrap_or_default();
        if access_token.is_empty() {
            return Ok(None);
        }
        let refresh_token = self.db.credential(REFRESH_TOKEN_KEY)?.unwrap_or_default();
        Ok(Some(Credentials {
            access_token,
            refresh_token,
        }))
    }

    pub(crate) fn set(&mut self, credentials: &Credentials) -> ClientResult<()> {
        self.db.put_credentials(&[
            (ACCESS_TOKEN_KEY, credentials.access_token.as_str()),
            (REFRESH_TOKEN_KEY, credentials.refresh_token.as_str()),
        ])?;
        Ok(())
    }
}

#[derive(Debug)]
pub(crate) enum AuthState {
    Authenticated(Credentials),
    /// The caller has to run the login flow. `cause` is `None` when no token
    /// was stored at all.
    Unauthenticated { cause: Option<ClientError> },
}

pub(crate) struct AuthClient<'a> {
    http: &'a HttpClient,
    store: &'a mut TokenStore,
}

impl<'a> AuthClient<'a> {
    pub(crate) fn new(http: &'a HttpClient, store: &'a mut TokenStore) -> Self {
        Self { http, store }
    }

    /// Checks the stored access token and falls back to a single refresh.
    pub(crate) fn verify_on_start(&mut self) -> ClientResult<AuthState> {
        let Some(stored) = self.store.get()? else {
            info!("no access token stored, login required");
            return Ok(AuthState::Unauthenticated { cause: None });
        };

        match self.verify_access_token(&stored.access_token) {
            Ok(()) => {
                info!("stored access token accepted");
                Ok(AuthState::Authenticated(stored))
            }
            Err(err) => {
                info!(error = %err, "access token rejected, trying refresh");
                match self.refresh_access_token(&stored.refresh_token) {
                    Ok(credentials) => Ok(AuthState::Authenticated(credentials)),
                    Err(err @ ClientError::Storage(_)) => Err(err),
                    Err(err) => {
                        info!(error = %err, "refresh failed, login required");
                        Ok(AuthState::Unauthenticated { cause: Some(err) })
                    }
                }
            }
        }
    }

    pub(crate) fn verify_access_token(&self, access_token: &str) -> ClientResult<()> {
        self.http.post_json(VERIFY_PATH, Some(access_token), "")?;
        Ok(())
    }

    pub(crate) fn refresh_access_token(&mut self, refresh_token: &str) -> ClientResult<Credentials> {
        if refresh_token.is_empty() {
            return Err(ClientError::AuthExpired(
                "no refresh token stored".to_string(),
            ));
        }

        let body = match self.http.post_json(REFRESH_PATH, Some(refresh_token), "") {
            Ok(body) => body,
            Err(err) if err.status().is_some() => {
                return Err(ClientError::AuthExpired(format!("refresh token rejected: {err}")));
            }
            Err(err) => return Err(err),
        };

        let envelope: Envelope<TokenPair> = serde_json::from_str(&body)?;
        let credentials = envelope
            .data
            .ok_or_else(|| missing("data"))?
            .into_credentials("data")?;
        self.store.set(&credentials)?;
        info!("tokens refreshed");
        Ok(credentials)
    }

    /// Phone-number login: identity check, then login with the resolved
    /// user name. Tokens are stored only when both calls succeed.
    pub(crate) fn login(&mut self, phone_number: &str) -> ClientResult<Credentials> {
        let identity = normalize_phone(phone_number, &self.http.config().country_code)?;
        let user_name = self.check_existing_user(&identity)?;
        info!(%identity, "account found, logging in");
        let credentials = self.login_user(&user_name)?;
        self.store.set(&credentials)?;
        info!("login successful");
        Ok(credentials)
    }

    pub(crate) fn check_existing_user(&self, identity: &str) -> ClientResult<String> {
        let request = CheckUserRequest {
            user_identity: identity,
            claim_assist: true,
            is_id_verified: true,
            id_verification_src: ID_VERIFICATION_SRC,
        };
        let body = self
            .http
            .post_json(EXISTING_USER_PATH, None, &serde_json::to_string(&request)?)?;

        let envelope: Envelope<CheckUserData> = serde_json::from_str(&body)?;
        let data = envelope.data.ok_or_else(|| missing("data"))?;
        let action = data
            .next_step
            .and_then(|step| step.action)
            .ok_or_else(|| missing("data.nextStep.action"))?;
        if action != LOGIN_ACTION {
            debug!(%identity, %action, "identity check did not offer login");
            return Err(ClientError::UserNotRegistered {
                identity: identity.to_string(),
                action,
            });
        }

        data.claim_assist
            .and_then(|assist| assist.user_claims)
            .and_then(|claims| claims.user_name)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| missing("data.claimAssist.userClaims.userName"))
    }

    pub(crate) fn login_user(&self, user_name: &str) -> ClientResult<Credentials> {
        let config = self.http.config();
        let request = LoginRequest {
            identity: user_name,
            fcm_device_token: "",
            device_id: &config.device_id,
            platform: &config.platform,
            claim_assist: true,
        };
        let body = self
            .http
            .post_json(LOGIN_PATH, None, &serde_json::to_string(&request)?)?;

        let envelope: Envelope<LoginData> = serde_json::from_str(&body)?;
        envelope
            .data
            .and_then(|data| data.user)
            .ok_or_else(|| missing("data.user"))?
            .into_credentials("data.user")
    }
}

/// Normalizes a phone number to `+<country>-<number>`.
///
/// Input that already carries a `+<country>-` prefix is validated and kept;
/// anything else is treated as a local number for `country_code`.
pub(crate) fn normalize_phone(raw: &str, country_code: &str) -> ClientResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ClientError::InvalidInput(
            "phone number is empty".to_string(),
        ));
    }

    let (country, local) = match trimmed.strip_prefix('+').and_then(|rest| rest.split_once('-')) {
        Some((country, local)) => (format!("+{}", country.trim()), local),
        None => (country_code.to_string(), trimmed),
    };

    let digits = local
        .chars()
        .filter(|ch| !matches!(ch, ' ' | '-' | '(' | ')'))
        .collect::<String>();
    let country_digits = country.trim_start_matches('+');
    if digits.is_empty()
        || !digits.chars().all(|ch| ch.is_ascii_digit())
        || country_digits.is_empty()
        || !country_digits.chars().all(|ch| ch.is_ascii_digit())
    {
        return Err(ClientError::InvalidInput(format!(
            "'{trimmed}' is not a phone number"
        )));
    }

    Ok(format!("{country}-{digits}"))
}

fn missing(field: &str) -> ClientError {
    ClientError::Decode(format!("response is missing `{field}`"))
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenPair {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

impl TokenPair {
    fn into_credentials(self, prefix: &str) -> ClientResult<Credentials> {
        let access_token = self
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| missing(&format!("{prefix}.accessToken")))?;
        let refresh_token = self
            .refresh_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| missing(&format!("{prefix}.refreshToken")))?;
        Ok(Credentials {
            access_token,
            refresh_token,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckUserData {
    next_step: Option<NextStep>,
    claim_assist: Option<ClaimAssist>,
}

#[derive(Debug, Deserialize)]
struct NextStep {
    action: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClaimAssist {
    user_claims: Option<UserClaims>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserClaims {
    user_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    user: Option<TokenPair>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckUserRequest<'a> {
    user_identity: &'a str,
    claim_assist: bool,
    is_id_verified: bool,
    id_verification_src: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    identity: &'a str,
    fcm_device_token: &'a str,
    device_id: &'a str,
    platform: &'a str,
    claim_assist: bool,
}
