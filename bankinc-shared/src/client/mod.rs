//! The Session & Action Client.
//!
//! [`BankClient`] ties together a [`SessionStore`], a [`Transport`] and an
//! [`ActivityLog`]. It keeps the session, decides which screen applies, and
//! turns user actions into API calls. Every call that is dispatched ends up
//! in the log, whatever its outcome.
//!
//! All methods take `&self`, so independent actions can be in flight at the
//! same time. Responses are applied in completion order. Login, registration
//! and logout carry a session epoch: a login or registration that completes
//! after a newer one has started does not touch the store.

mod outcome;

use serde_json::json;
use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicU64, Ordering},
};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    action::{Action, coerce_amount, resolve_id},
    activity::{ActivityLog, LogRecord},
    config::ClientConfig,
    models::{
        AnnulationRequest, AuthResponse, CardCreateRequest, GeneratedCard, PurchaseRequest,
        first_card_id,
    },
    session::{SessionKey, SessionSnapshot, SessionStore, View},
    transport::{ApiResponse, HttpRequest, ResponseBody, Transport},
};

pub use outcome::{
    ClientError, LoginOutcome, RegistrationOutcome, RegistrationProfile, ValidationError,
};

/// Client for the BankInc card and transaction API.
#[derive(Debug)]
pub struct BankClient {
    base_url: Url,
    transport: Arc<dyn Transport>,
    store: Arc<dyn SessionStore>,
    log: ActivityLog,
    default_product_id: String,
    epoch: AtomicU64,
    view: Mutex<View>,
}

impl BankClient {
    /// Creates a client talking to `base_url`.
    pub fn new(
        base_url: Url,
        transport: Arc<dyn Transport>,
        store: Arc<dyn SessionStore>,
        log: ActivityLog,
    ) -> Self {
        Self {
            base_url,
            transport,
            store,
            log,
            default_product_id: crate::config::client::DEFAULT_PRODUCT_ID.to_string(),
            epoch: AtomicU64::new(0),
            view: Mutex::new(View::SignedOut),
        }
    }

    /// Creates a client from resolved configuration.
    pub fn from_config(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn SessionStore>,
        log: ActivityLog,
    ) -> Self {
        Self::new(config.base_url.clone(), transport, store, log)
            .with_default_product_id(config.default_product_id.clone())
    }

    /// Product used for generated cards when none is given.
    #[must_use]
    pub fn with_default_product_id(mut self, product_id: impl Into<String>) -> Self {
        self.default_product_id = product_id.into();
        self
    }

    /// The activity log this client records into.
    #[must_use]
    pub const fn log(&self) -> &ActivityLog {
        &self.log
    }

    /// Screen the client is currently showing.
    #[must_use]
    pub fn view(&self) -> View {
        *self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_view(&self, view: View) {
        *self.view.lock().unwrap_or_else(PoisonError::into_inner) = view;
    }

    /// Current contents of the session store.
    ///
    /// # Errors
    /// Returns [`ClientError::Storage`] if the store cannot be read.
    pub fn session(&self) -> Result<SessionSnapshot, ClientError> {
        Ok(SessionSnapshot::load(self.store.as_ref())?)
    }

    fn begin_session_change(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.current_epoch() == epoch
    }

    fn reject(&self, error: ValidationError) -> ClientError {
        self.log.record(LogRecord::Notice(error.to_string()));
        ClientError::Validation(error)
    }

    async fn dispatch(&self, action: &Action) -> Result<ApiResponse, ClientError> {
        let descriptor = action.descriptor();
        let url = descriptor.url(&self.base_url);
        let bearer = self.store.get(SessionKey::Token)?;
        debug!(
            action = action.name(),
            method = %descriptor.method,
            url = %url,
            authenticated = bearer.is_some(),
            "dispatching request"
        );

        let request = HttpRequest {
            method: descriptor.method,
            url: url.clone(),
            body: descriptor.body,
            bearer,
        };
        match self.transport.send(request).await {
            Ok(raw) => {
                let response = ApiResponse {
                    url: url.to_string(),
                    status: raw.status,
                    body: ResponseBody::parse(&raw.text),
                };
                debug!(action = action.name(), status = response.status, "request completed");
                self.log.record(LogRecord::from(&response));
                Ok(response)
            }
            Err(err) => {
                warn!(action = action.name(), error = %err, "request failed");
                self.log.record(LogRecord::Response {
                    url: url.to_string(),
                    status: None,
                    body: ResponseBody::Text(err.to_string()),
                });
                Err(err.into())
            }
        }
    }

    /// Signs in and loads the caller's cards.
    ///
    /// # Errors
    /// Validation errors for blank input (nothing is sent), transport and
    /// storage failures. A refused login is [`LoginOutcome::Rejected`].
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, ClientError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(self.reject(ValidationError::MissingCredentials));
        }

        let epoch = self.begin_session_change();
        let credentials = crate::models::Credentials::new(username, password);
        let response = self.dispatch(&Action::Login(credentials)).await?;

        let Some(auth) = AuthResponse::from_response(&response) else {
            warn!(username, status = response.status, "login rejected");
            self.log.record(LogRecord::event(
                "login_failed",
                json!({"body": response.body.to_json()}),
            ));
            return Ok(LoginOutcome::Rejected(response));
        };
        if !self.is_current(epoch) {
            debug!(username, "dropping superseded login");
            return Ok(LoginOutcome::Superseded);
        }

        self.start_session(username, &auth.token)?;
        let card_id = self.load_cards(epoch).await?;
        if !self.is_current(epoch) {
            debug!(username, "dropping login superseded while loading cards");
            return Ok(LoginOutcome::Superseded);
        }
        info!(username, "signed in");
        self.log.record(LogRecord::event("login", json!({"user": username})));

        Ok(LoginOutcome::Authenticated {
            username: username.to_string(),
            card_id,
        })
    }

    /// Creates an account, signs in with it and creates its default card.
    ///
    /// # Errors
    /// Validation errors for an incomplete profile (nothing is sent),
    /// transport failures on the registration call, and storage failures.
    pub async fn register(
        &self,
        profile: &RegistrationProfile,
    ) -> Result<RegistrationOutcome, ClientError> {
        if let Err(err) = profile.validate() {
            return Err(self.reject(err));
        }

        let epoch = self.begin_session_change();
        let response = self.dispatch(&Action::Register(profile.credentials())).await?;

        let Some(auth) = AuthResponse::from_response(&response) else {
            warn!(username = %profile.username, status = response.status, "registration rejected");
            self.log.record(LogRecord::event(
                "register_failed",
                json!({"body": response.body.to_json()}),
            ));
            return Ok(RegistrationOutcome::Rejected(response));
        };
        if !self.is_current(epoch) {
            return Ok(RegistrationOutcome::Superseded);
        }

        let username = profile.username.clone();
        self.start_session(&username, &auth.token)?;
        info!(username = %username, "registered");

        let request = CardCreateRequest {
            product_id: self.default_product_id.clone(),
            holder_name: profile.full_name.clone(),
        };
        let card_result = self.dispatch(&Action::GenerateCard(request)).await;
        if !self.is_current(epoch) {
            debug!(username = %username, "dropping registration superseded while creating its card");
            return Ok(RegistrationOutcome::Superseded);
        }
        let card_response = match card_result {
            Ok(card_response) => card_response,
            Err(ClientError::Transport(err)) => {
                return Ok(self.card_creation_failed(
                    username,
                    None,
                    json!({"error": err.to_string()}),
                ));
            }
            Err(err) => return Err(err),
        };

        if card_response.status != 200 {
            let detail = json!({"body": card_response.body.to_json()});
            return Ok(self.card_creation_failed(username, Some(card_response), detail));
        }

        let card = GeneratedCard::from_body(&card_response.body);
        if let Some(card) = &card {
            self.store.set(SessionKey::CardId, &card.card_id)?;
        }
        self.load_cards(epoch).await?;
        if !self.is_current(epoch) {
            debug!(username = %username, "dropping registration superseded while loading cards");
            return Ok(RegistrationOutcome::Superseded);
        }
        self.log.record(LogRecord::event(
            "registered",
            json!({"user": username, "card": card_response.body.to_json()}),
        ));

        Ok(RegistrationOutcome::Registered { username, card })
    }

    /// Only called while the registration's epoch is still current.
    fn card_creation_failed(
        &self,
        username: String,
        response: Option<ApiResponse>,
        detail: serde_json::Value,
    ) -> RegistrationOutcome {
        warn!(username = %username, "registered but the default card was not created");
        let mut detail = detail;
        detail["user"] = json!(username);
        self.log
            .record(LogRecord::event("registered_but_card_failed", detail));
        self.set_view(View::Dashboard);
        RegistrationOutcome::CardCreationFailed { username, response }
    }

    fn start_session(&self, username: &str, token: &str) -> Result<(), ClientError> {
        // Username first: a token must never be stored without its user.
        self.store.remove(SessionKey::CardId)?;
        self.store.set(SessionKey::Username, username)?;
        self.store.set(SessionKey::Token, token)?;
        Ok(())
    }

    /// Clears the session and returns to the signed-out screen. Idempotent.
    ///
    /// Any login or registration still in flight will not be applied.
    ///
    /// # Errors
    /// Returns [`ClientError::Storage`] if the store cannot be cleared; the
    /// view is signed out regardless.
    pub fn logout(&self) -> Result<(), ClientError> {
        self.begin_session_change();
        let cleared = self.store.clear();
        self.set_view(View::SignedOut);
        cleared?;
        info!("signed out");
        self.log.record(LogRecord::event("logout", json!({})));
        Ok(())
    }

    /// Picks the start-up screen from what the store remembers.
    ///
    /// With a stored user and token this re-enters the dashboard and
    /// refreshes the active card on a best-effort basis. Never fails: an
    /// unreadable store counts as signed out.
    pub async fn restore_session(&self) -> View {
        let snapshot = self.session().unwrap_or_else(|err| {
            warn!(error = %err, "session store unreadable, starting signed out");
            SessionSnapshot::default()
        });
        if !snapshot.is_authenticated() {
            self.set_view(View::SignedOut);
            return View::SignedOut;
        }

        info!(username = snapshot.username.as_deref().unwrap_or_default(), "restoring session");
        let epoch = self.current_epoch();
        if let Err(err) = self.load_cards(epoch).await {
            warn!(error = %err, "could not refresh cards while restoring the session");
            if self.is_current(epoch) {
                self.set_view(View::Dashboard);
            }
        }
        self.view()
    }

    /// Fetches the caller's cards and remembers the first one.
    ///
    /// Failing to reach the service is tolerated; the dashboard is shown
    /// either way.
    async fn load_cards(&self, epoch: u64) -> Result<Option<String>, ClientError> {
        let first = match self.dispatch(&Action::ListMyCards).await {
            Ok(response) if response.status == 200 => first_card_id(&response.body),
            Ok(_) => None,
            Err(ClientError::Transport(err)) => {
                warn!(error = %err, "could not fetch cards");
                None
            }
            Err(err) => return Err(err),
        };
        if !self.is_current(epoch) {
            return Ok(None);
        }
        if let Some(card_id) = &first {
            self.store.set(SessionKey::CardId, card_id)?;
        }
        self.set_view(View::Dashboard);
        Ok(first)
    }

    /// Lists the caller's cards.
    ///
    /// When no card is remembered yet, the first listed card becomes the
    /// active card.
    ///
    /// # Errors
    /// Transport and storage failures.
    pub async fn list_cards(&self) -> Result<ApiResponse, ClientError> {
        let response = self.dispatch(&Action::ListMyCards).await?;
        if response.status == 200 && self.store.get(SessionKey::CardId)?.is_none() {
            if let Some(card_id) = first_card_id(&response.body) {
                self.store.set(SessionKey::CardId, &card_id)?;
            }
        }
        Ok(response)
    }

    /// Requests a new card. Blank fields fall back to the configured
    /// product and the signed-in username.
    ///
    /// A successfully generated card becomes the active card.
    ///
    /// # Errors
    /// Transport and storage failures.
    pub async fn generate_card(
        &self,
        product_id: Option<&str>,
        holder_name: Option<&str>,
    ) -> Result<ApiResponse, ClientError> {
        let product_id = resolve_id(product_id, Some(self.default_product_id.clone()))
            .unwrap_or_else(|| self.default_product_id.clone());
        let holder_name = match resolve_id(holder_name, None) {
            Some(name) => name,
            None => self.store.get(SessionKey::Username)?.unwrap_or_default(),
        };

        let response = self
            .dispatch(&Action::GenerateCard(CardCreateRequest {
                product_id,
                holder_name,
            }))
            .await?;
        if response.status == 200 {
            if let Some(card) = GeneratedCard::from_body(&response.body) {
                self.store.set(SessionKey::CardId, &card.card_id)?;
            }
        }
        Ok(response)
    }

    fn require_card(&self, card_id: Option<&str>) -> Result<String, ClientError> {
        let remembered = self.store.get(SessionKey::CardId)?;
        resolve_id(card_id, remembered).ok_or_else(|| self.reject(ValidationError::MissingCardId))
    }

    fn require_transaction(&self, transaction_id: Option<&str>) -> Result<String, ClientError> {
        resolve_id(transaction_id, None)
            .ok_or_else(|| self.reject(ValidationError::MissingTransactionId))
    }

    /// Activates a card.
    ///
    /// # Errors
    /// [`ValidationError::MissingCardId`] when neither `card_id` nor an
    /// active card is available; transport and storage failures.
    pub async fn enroll_card(&self, card_id: Option<&str>) -> Result<ApiResponse, ClientError> {
        let card_id = self.require_card(card_id)?;
        self.dispatch(&Action::EnrollCard { card_id }).await
    }

    /// Blocks a card.
    ///
    /// # Errors
    /// Same as [`BankClient::enroll_card`].
    pub async fn block_card(&self, card_id: Option<&str>) -> Result<ApiResponse, ClientError> {
        let card_id = self.require_card(card_id)?;
        self.dispatch(&Action::BlockCard { card_id }).await
    }

    /// Adds `amount` (free text, coerced to a number) to a card's balance.
    ///
    /// # Errors
    /// Same as [`BankClient::enroll_card`].
    pub async fn recharge(
        &self,
        card_id: Option<&str>,
        amount: &str,
    ) -> Result<ApiResponse, ClientError> {
        let card_id = self.require_card(card_id)?;
        let amount = coerce_amount(amount);
        self.dispatch(&Action::Recharge { card_id, amount }).await
    }

    /// Reads a card's balance.
    ///
    /// # Errors
    /// Same as [`BankClient::enroll_card`].
    pub async fn balance(&self, card_id: Option<&str>) -> Result<ApiResponse, ClientError> {
        let card_id = self.require_card(card_id)?;
        self.dispatch(&Action::Balance { card_id }).await
    }

    /// Charges `price` (free text, coerced to a number) to a card.
    ///
    /// # Errors
    /// Same as [`BankClient::enroll_card`].
    pub async fn purchase(
        &self,
        card_id: Option<&str>,
        price: &str,
    ) -> Result<ApiResponse, ClientError> {
        let card_id = self.require_card(card_id)?;
        let price = coerce_amount(price);
        self.dispatch(&Action::Purchase(PurchaseRequest { card_id, price }))
            .await
    }

    /// Looks a transaction up.
    ///
    /// # Errors
    /// [`ValidationError::MissingTransactionId`] for a blank id; transport
    /// and storage failures.
    pub async fn get_transaction(
        &self,
        transaction_id: Option<&str>,
    ) -> Result<ApiResponse, ClientError> {
        let transaction_id = self.require_transaction(transaction_id)?;
        self.dispatch(&Action::GetTransaction { transaction_id })
            .await
    }

    /// Asks the service to annul a transaction.
    ///
    /// # Errors
    /// Same as [`BankClient::get_transaction`].
    pub async fn annul_transaction(
        &self,
        transaction_id: Option<&str>,
    ) -> Result<ApiResponse, ClientError> {
        let transaction_id = self.require_transaction(transaction_id)?;
        self.dispatch(&Action::AnnulTransaction(AnnulationRequest { transaction_id }))
            .await
    }
}
