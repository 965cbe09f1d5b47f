//! Login state: Unauthenticated -> AwaitingVerifier -> Authenticated.

use std::io::{BufRead, Write};

use url::Url;

use crate::credentials::{Credential, CredentialStore};
use crate::error::{Error, Result};
use crate::flickr_client::{Authorizer, PendingAuthorization};

#[derive(Debug, Clone)]
pub enum SessionState {
    Unauthenticated,
    AwaitingVerifier(PendingAuthorization),
    Authenticated(Credential),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// A credential was already saved and overwriting was not asked for.
    AlreadyExists,
    /// The given token and secret were saved as they are.
    Stored,
    /// A new credential was obtained through the authorization page.
    Authorized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutOutcome {
    Removed,
    NotLoggedIn,
}

pub struct AuthSession<'a> {
    store: &'a CredentialStore,
    state: SessionState,
}

impl<'a> AuthSession<'a> {
    pub fn new(store: &'a CredentialStore) -> AuthSession<'a> {
        AuthSession {
            store,
            state: SessionState::Unauthenticated,
        }
    }

    /// The credential to sign requests with, once authenticated.
    pub fn credential(&self) -> Option<&Credential> {
        match &self.state {
            SessionState::Authenticated(credential) => Some(credential),
            _ => None,
        }
    }

    /// Loads the saved credential. Without one only public photos can be
    /// downloaded, which is not an error.
    pub fn load_stored(&mut self) -> Result<Option<&Credential>> {
        log::trace!(
            "Fetching auth tokens from file: {}",
            self.store.path().display()
        );

        match self.store.load()? {
            Some(credential) => self.state = SessionState::Authenticated(credential),
            None => log::warn!(
                "OAuth token file not created. You will proceed without login and will not be able to download any private content that requires login."
            ),
        }
        Ok(self.credential())
    }

    pub async fn interactive_login<A: Authorizer>(
        &mut self,
        authorizer: &A,
        token: Option<String>,
        secret: Option<String>,
        overwrite: bool,
        input: &mut impl BufRead,
    ) -> Result<LoginOutcome> {
        if self.store.exists() && !overwrite {
            log::info!(
                "Login auth token already exists. To overwrite existing auth token, use --overwrite option."
            );
            return Ok(LoginOutcome::AlreadyExists);
        }

        if let (Some(token), Some(secret)) = (token, secret) {
            let credential = Credential { token, secret };
            self.store.save(&credential)?;
            self.state = SessionState::Authenticated(credential);
            log::info!("Login tokens successfully created.");
            return Ok(LoginOutcome::Stored);
        }

        log::info!("Login auth tokens not found. Generating new login tokens.");
        let authorize_url = self.begin_authorization(authorizer).await?;

        println!("\nAuthorization URL: {authorize_url}\n");
        println!("Navigate to above URL, login and authorize access to the");
        println!("flickr account. On successful authorization you will be");
        println!("shown a verification code, you will need it to login.\n");

        let verifier = prompt_verifier(input)?;
        log::trace!("OAuth Verifier: {verifier}");

        self.complete_authorization(authorizer, &verifier).await?;
        log::info!("Login tokens successfully created.");
        Ok(LoginOutcome::Authorized)
    }

    /// Requests a token and returns the page the user has to approve it on.
    pub async fn begin_authorization<A: Authorizer>(&mut self, authorizer: &A) -> Result<Url> {
        let pending = authorizer.request_authorization().await?;
        let authorize_url = pending.authorize_url.clone();
        self.state = SessionState::AwaitingVerifier(pending);
        Ok(authorize_url)
    }

    /// Exchanges the verifier for an access token and saves it.
    pub async fn complete_authorization<A: Authorizer>(
        &mut self,
        authorizer: &A,
        verifier: &str,
    ) -> Result<()> {
        let SessionState::AwaitingVerifier(pending) =
            std::mem::replace(&mut self.state, SessionState::Unauthenticated)
        else {
            return Err(Error::OAuth("no authorization in progress".to_string()));
        };

        let verifier = verifier.trim();
        if verifier.is_empty() {
            return Err(Error::InteractiveAuthAborted);
        }

        let credential = authorizer.exchange_verifier(&pending, verifier).await?;
        self.store.save(&credential)?;
        self.state = SessionState::Authenticated(credential);
        Ok(())
    }

    pub fn logout(&mut self) -> Result<LogoutOutcome> {
        self.state = SessionState::Unauthenticated;

        if self.store.delete()? {
            log::info!("Logout successful. Auth tokens removed.");
            Ok(LogoutOutcome::Removed)
        } else {
            log::info!("No auth tokens found. Logout not required.");
            Ok(LogoutOutcome::NotLoggedIn)
        }
    }
}

fn prompt_verifier(input: &mut impl BufRead) -> Result<String> {
    print!("Enter the OAuth Verifier: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::fs;
    use std::io::Cursor;

    use url::Url;

    use super::{AuthSession, LoginOutcome, LogoutOutcome, SessionState};
    use crate::credentials::{Credential, CredentialStore};
    use crate::error::{Error, Result};
    use crate::flickr_client::{Authorizer, PendingAuthorization};

    #[derive(Default)]
    struct FakeAuthorizer {
        verifiers: RefCell<Vec<String>>,
        requests: RefCell<usize>,
    }

    impl Authorizer for FakeAuthorizer {
        async fn request_authorization(&self) -> Result<PendingAuthorization> {
            *self.requests.borrow_mut() += 1;
            Ok(PendingAuthorization {
                authorize_url: Url::parse(
                    "https://www.flickr.com/services/oauth/authorize?oauth_token=req&perms=read",
                )
                .unwrap(),
                request_token: Credential {
                    token: "req".to_string(),
                    secret: "req-secret".to_string(),
                },
            })
        }

        async fn exchange_verifier(
            &self,
            pending: &PendingAuthorization,
            verifier: &str,
        ) -> Result<Credential> {
            assert_eq!("req", pending.request_token.token);
            self.verifiers.borrow_mut().push(verifier.to_string());
            Ok(Credential {
                token: "access".to_string(),
                secret: "access-secret".to_string(),
            })
        }
    }

    fn store_in(dir: &tempfile::TempDir) -> CredentialStore {
        CredentialStore::new(dir.path().join(".flickroauthtoken"))
    }

    #[test]
    fn logout_twice_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "token\nsecret").unwrap();
        let mut session = AuthSession::new(&store);

        assert_eq!(LogoutOutcome::Removed, session.logout().unwrap());
        assert_eq!(LogoutOutcome::NotLoggedIn, session.logout().unwrap());
        assert!(!store.path().exists());
    }

    #[test]
    fn load_stored_without_file_stays_anonymous() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut session = AuthSession::new(&store);

        assert_eq!(None, session.load_stored().unwrap());
        assert!(matches!(&session.state, SessionState::Unauthenticated));
    }

    #[test]
    fn load_stored_installs_credential() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "token\nsecret\n").unwrap();
        let mut session = AuthSession::new(&store);

        let credential = session.load_stored().unwrap().cloned().unwrap();

        assert_eq!("token", credential.token);
        assert_eq!(Some(&credential), session.credential());
        assert!(matches!(&session.state, SessionState::Authenticated(c) if c.secret == "secret"));
    }

    #[tokio::test]
    async fn existing_credential_is_kept_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "old\nold-secret").unwrap();
        let authorizer = FakeAuthorizer::default();
        let mut session = AuthSession::new(&store);

        let outcome = session
            .interactive_login(
                &authorizer,
                Some("new".to_string()),
                Some("new-secret".to_string()),
                false,
                &mut Cursor::new(&b""[..]),
            )
            .await
            .unwrap();

        assert_eq!(LoginOutcome::AlreadyExists, outcome);
        assert_eq!("old\nold-secret", fs::read_to_string(store.path()).unwrap());
        assert_eq!(0, *authorizer.requests.borrow());
    }

    #[tokio::test]
    async fn supplied_token_is_written_directly() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "old\nold-secret").unwrap();
        let authorizer = FakeAuthorizer::default();
        let mut session = AuthSession::new(&store);

        let outcome = session
            .interactive_login(
                &authorizer,
                Some("new".to_string()),
                Some("new-secret".to_string()),
                true,
                &mut Cursor::new(&b""[..]),
            )
            .await
            .unwrap();

        assert_eq!(LoginOutcome::Stored, outcome);
        assert_eq!("new\nnew-secret", fs::read_to_string(store.path()).unwrap());
        assert_eq!(0, *authorizer.requests.borrow());
    }

    #[tokio::test]
    async fn verifier_completes_authorization() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let authorizer = FakeAuthorizer::default();
        let mut session = AuthSession::new(&store);

        let outcome = session
            .interactive_login(
                &authorizer,
                Some("only-token".to_string()),
                None,
                false,
                &mut Cursor::new(&b"123-456-789\n"[..]),
            )
            .await
            .unwrap();

        assert_eq!(LoginOutcome::Authorized, outcome);
        assert_eq!(vec!["123-456-789"], *authorizer.verifiers.borrow());
        assert_eq!(
            "access\naccess-secret",
            fs::read_to_string(store.path()).unwrap()
        );
        assert!(matches!(&session.state, SessionState::Authenticated(_)));
    }

    #[tokio::test]
    async fn empty_verifier_aborts_login() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let authorizer = FakeAuthorizer::default();
        let mut session = AuthSession::new(&store);

        let err = session
            .interactive_login(&authorizer, None, None, false, &mut Cursor::new(&b"\n"[..]))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InteractiveAuthAborted));
        assert!(!store.exists());
        assert!(authorizer.verifiers.borrow().is_empty());
        assert!(matches!(&session.state, SessionState::Unauthenticated));
    }

    #[tokio::test]
    async fn completing_without_pending_authorization_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut session = AuthSession::new(&store);

        let err = session
            .complete_authorization(&FakeAuthorizer::default(), "123")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::OAuth(_)));
    }
}
