//! Server-side RPC handlers.
//!
//! [`KeeperService`] answers each [`KeeperRequest`] independently. Data
//! operations re-verify the caller's token on every call and take the owner
//! id from it; no request field can name another owner. The service never
//! derives keys and never sees plaintext.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::backend::VaultBackend;
use crate::clock::{Clock, SystemClock};
use crate::config::SecurityConfig;
use crate::identity::{IdentityService, TokenSigner};
use crate::protocol::{
    AuthenticateUserRequest, DataItem, ErrorCode, KeeperRequest, KeeperResponse,
    MasterSeedRetrieveRequest, MasterSeedRetrieveResponse, RegisterUserRequest,
    RetrieveDataRequest, RetrieveDataResponse, Status, StoreDataRequest, StoreDataResponse,
    TokenResponse, UserExistsRequest, UserExistsResponse, messages,
};
use crate::types::{NewVaultEntry, UserId};
use crate::{Error, ErrorKind, Result};

/// The Keeper RPC service.
#[derive(Clone)]
pub struct KeeperService {
    identity: IdentityService,
}

impl KeeperService {
    /// Build a service over `backend` using the system clock.
    pub fn new(backend: Arc<dyn VaultBackend>, config: &SecurityConfig) -> Self {
        Self::with_clock(backend, config, Arc::new(SystemClock))
    }

    /// Build a service whose token expiry reads time from `clock`.
    pub fn with_clock(
        backend: Arc<dyn VaultBackend>,
        config: &SecurityConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let signer = TokenSigner::new(config, clock);
        Self {
            identity: IdentityService::new(backend, signer),
        }
    }

    pub fn identity(&self) -> &IdentityService {
        &self.identity
    }

    fn backend(&self) -> &Arc<dyn VaultBackend> {
        self.identity.backend()
    }

    /// Dispatch one request.
    ///
    /// Returns `Err` only for faults the caller cannot act on (store
    /// failures); every domain outcome is an `Ok` response.
    pub async fn handle(&self, request: KeeperRequest) -> Result<KeeperResponse> {
        debug!(rpc = request.name(), "Handling request");
        let response = match request {
            KeeperRequest::UserExists(r) => KeeperResponse::UserExists(self.user_exists(r).await?),
            KeeperRequest::RegisterUser(r) => {
                KeeperResponse::RegisterUser(self.register_user(r).await?)
            }
            KeeperRequest::AuthenticateUser(r) => {
                KeeperResponse::AuthenticateUser(self.authenticate_user(r).await?)
            }
            KeeperRequest::StoreData(r) => KeeperResponse::StoreData(self.store_data(r).await?),
            KeeperRequest::RetrieveData(r) => {
                KeeperResponse::RetrieveData(self.retrieve_data(r).await?)
            }
            KeeperRequest::MasterSeedRetrieve(r) => {
                KeeperResponse::MasterSeedRetrieve(self.master_seed_retrieve(r).await?)
            }
        };
        Ok(response)
    }

    pub async fn user_exists(&self, request: UserExistsRequest) -> Result<UserExistsResponse> {
        let exists = self.identity.user_exists(&request.username).await?;
        Ok(UserExistsResponse {
            exists,
            status: Status::ok(""),
        })
    }

    pub async fn register_user(&self, request: RegisterUserRequest) -> Result<TokenResponse> {
        let result = self
            .identity
            .register(&request.username, &request.password, &request.seed)
            .await;
        match result {
            Ok(token) => Ok(TokenResponse {
                token,
                status: Status::ok(messages::USER_REGISTERED),
            }),
            Err(e) => Ok(TokenResponse {
                token: String::new(),
                status: failure(e, |kind| match kind {
                    ErrorKind::Conflict => Some(messages::USER_EXISTS),
                    _ => None,
                })?,
            }),
        }
    }

    pub async fn authenticate_user(
        &self,
        request: AuthenticateUserRequest,
    ) -> Result<TokenResponse> {
        let result = self
            .identity
            .authenticate(&request.username, &request.password)
            .await;
        match result {
            Ok(token) => Ok(TokenResponse {
                token,
                status: Status::ok(messages::AUTHENTICATED),
            }),
            Err(e) => Ok(TokenResponse {
                token: String::new(),
                status: failure(e, |kind| match kind {
                    ErrorKind::Unauthorized => Some(messages::INVALID_CREDENTIALS),
                    _ => None,
                })?,
            }),
        }
    }

    pub async fn store_data(&self, request: StoreDataRequest) -> Result<StoreDataResponse> {
        let owner_id = match self.authorize(&request.token) {
            Ok(id) => id,
            Err(status) => return Ok(StoreDataResponse { status }),
        };

        let entry = NewVaultEntry::new(
            owner_id,
            request.data_type,
            request.data,
            request.metadata,
        );
        match self.backend().store_entry(entry).await {
            Ok(stored) => {
                debug!(entry_id = stored.id, %owner_id, "Stored vault entry");
                Ok(StoreDataResponse {
                    status: Status::ok(messages::DATA_STORED),
                })
            }
            Err(e) => Ok(StoreDataResponse {
                status: failure(e, |kind| match kind {
                    ErrorKind::NotFound => Some(messages::USER_NOT_FOUND),
                    _ => None,
                })?,
            }),
        }
    }

    pub async fn retrieve_data(&self, request: RetrieveDataRequest) -> Result<RetrieveDataResponse> {
        let owner_id = match self.authorize(&request.token) {
            Ok(id) => id,
            Err(status) => {
                return Ok(RetrieveDataResponse {
                    items: Vec::new(),
                    status,
                });
            }
        };

        let entries = self
            .backend()
            .retrieve_entries(owner_id, request.filter_type)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to retrieve entries"))?;

        let items = entries
            .into_iter()
            .map(|entry| DataItem {
                data_type: entry.data_type,
                metadata: entry.metadata,
                data: entry.data,
            })
            .collect();

        Ok(RetrieveDataResponse {
            items,
            status: Status::ok(messages::DATA_RETRIEVED),
        })
    }

    pub async fn master_seed_retrieve(
        &self,
        request: MasterSeedRetrieveRequest,
    ) -> Result<MasterSeedRetrieveResponse> {
        let user_id = match self.authorize(&request.token) {
            Ok(id) => id,
            Err(status) => {
                return Ok(MasterSeedRetrieveResponse {
                    master_seed: String::new(),
                    status,
                });
            }
        };

        match self.backend().get_master_seed(user_id).await {
            Ok(master_seed) => Ok(MasterSeedRetrieveResponse {
                master_seed,
                status: Status::ok(messages::SEED_RETRIEVED),
            }),
            Err(e) => Ok(MasterSeedRetrieveResponse {
                master_seed: String::new(),
                status: failure(e, |kind| match kind {
                    ErrorKind::NotFound => Some(messages::USER_NOT_FOUND),
                    _ => None,
                })?,
            }),
        }
    }

    /// Resolve the caller from its token, or the failure status to send back.
    fn authorize(&self, token: &str) -> std::result::Result<UserId, Status> {
        self.identity
            .verify_token(token)
            .map_err(|_| Status::failed(ErrorCode::Unauthorized, messages::UNAUTHORIZED))
    }
}

/// Turn a domain error into a failure status, or pass internal faults through.
///
/// `message_for` overrides the message shown for a kind; otherwise the
/// error's own text is used.
fn failure(err: Error, message_for: impl Fn(ErrorKind) -> Option<&'static str>) -> Result<Status> {
    let kind = err.kind();
    match kind {
        ErrorKind::Internal | ErrorKind::Transport | ErrorKind::AuthenticationFailure => {
            error!(error = %err, "Request failed");
            Err(err)
        }
        _ => {
            warn!(error = %err, "Request rejected");
            let message = message_for(kind)
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string());
            Ok(Status::failed(kind.into(), message))
        }
    }
}
