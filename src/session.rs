//! A session that logs itself in whenever the site bounces a request to
//! the login page.

use log::debug;

use crate::auth::{self, Login};
use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::pacing::Pacer;
use crate::pages::PageParser;
use crate::web::cookies;
use crate::web::{Cookie, WebRequest, WebResponse, WebSession};

/// The collaborators every page-level client borrows.
#[derive(Clone, Copy)]
pub struct SessionContext<'a> {
    pub session: &'a dyn WebSession,
    pub parser: &'a dyn PageParser,
    pub pacer: &'a dyn Pacer,
}

/// Wraps a transport session. A request that lands on the login page
/// triggers the login journey (seeded with that page) and is then sent
/// once more. Landing on the login page a second time is an error.
pub struct AuthenticatedSession<S> {
    inner: S,
    credentials: Credentials,
    parser: Box<dyn PageParser>,
    pacer: Box<dyn Pacer>,
}

impl<S: WebSession> AuthenticatedSession<S> {
    pub fn new(
        inner: S,
        credentials: Credentials,
        parser: Box<dyn PageParser>,
        pacer: Box<dyn Pacer>,
    ) -> Self {
        Self {
            inner,
            credentials,
            parser,
            pacer,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn parser(&self) -> &dyn PageParser {
        &*self.parser
    }

    pub fn pacer(&self) -> &dyn Pacer {
        &*self.pacer
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Context whose requests re-authenticate transparently.
    pub fn context(&self) -> SessionContext<'_> {
        SessionContext {
            session: self,
            parser: &*self.parser,
            pacer: &*self.pacer,
        }
    }

    /// Login traffic goes straight to the transport: the login pages
    /// themselves live at the login URL.
    fn login_context(&self) -> SessionContext<'_> {
        SessionContext {
            session: &self.inner,
            parser: &*self.parser,
            pacer: &*self.pacer,
        }
    }

    /// Run the login journey from scratch.
    pub fn login(&self) -> Result<WebResponse> {
        Login::new(self.login_context(), &self.credentials).run()
    }

    pub fn logout(&self) {
        auth::logout(self.login_context());
    }

    pub fn is_logged_in(&self) -> bool {
        cookies::is_logged_in(&self.inner.cookies())
    }
}

impl<S: WebSession> WebSession for AuthenticatedSession<S> {
    fn send(&self, request: &WebRequest) -> Result<WebResponse> {
        let response = self.inner.send(request)?;
        if !auth::is_login_page(&response.url) {
            return Ok(response);
        }

        debug!("Redirected to login page, logging in ...");
        Login::new(self.login_context(), &self.credentials)
            .seeded(response)
            .run()?;

        debug!("Re-sending {} {}", request.method.as_str(), request.url);
        let retried = self.inner.send(request)?;
        if auth::is_login_page(&retried.url) {
            return Err(Error::Session(format!(
                "{} still redirects to login after re-authenticating",
                request.url
            )));
        }
        Ok(retried)
    }

    fn add_cookie(&self, cookie: Cookie) {
        self.inner.add_cookie(cookie);
    }

    fn cookies(&self) -> Vec<Cookie> {
        self.inner.cookies()
    }

    fn reset_cookies(&self) {
        self.inner.reset_cookies();
    }
}
