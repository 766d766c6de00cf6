//! The three-page login journey as an explicit state machine.
//!
//! ```text
//! Anonymous -> TokenIssued -> UsernameSubmitted -> NumbersRequested -> Authenticated
//!      \____________\_______________\___________________\_________-> Failed
//! ```

use std::fmt;

use log::debug;
use rand::Rng;

use crate::credentials::Credentials;
use crate::error::{AuthError, Error, LoginStep, Result};
use crate::session::SessionContext;
use crate::types::SecurityToken;
use crate::web::cookies;
use crate::web::{WebRequest, WebResponse};

/// Step one of login; expired sessions are redirected here.
pub const LOGIN_URL: &str = "https://online.hl.co.uk/my-accounts/login-step-one";

/// Step two of login (password and secure-number digits).
pub const LOGIN_STEP_TWO_URL: &str = "https://online.hl.co.uk/my-accounts/login-step-two";

/// Phrase the login pages show when input is rejected.
const REJECTED_PHRASE: &str = "try again";

/// Where the login journey currently is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginState {
    Anonymous,
    TokenIssued {
        token: SecurityToken,
    },
    UsernameSubmitted {
        token: SecurityToken,
        page: String,
    },
    NumbersRequested {
        token: SecurityToken,
        positions: [usize; 3],
    },
    Authenticated,
    Failed,
}

impl LoginState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoginState::Authenticated | LoginState::Failed)
    }
}

impl fmt::Display for LoginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoginState::Anonymous => "Anonymous",
            LoginState::TokenIssued { .. } => "TokenIssued",
            LoginState::UsernameSubmitted { .. } => "UsernameSubmitted",
            LoginState::NumbersRequested { .. } => "NumbersRequested",
            LoginState::Authenticated => "Authenticated",
            LoginState::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// Drives one login attempt.
pub struct Login<'a> {
    ctx: SessionContext<'a>,
    credentials: &'a Credentials,
    state: LoginState,
    /// A login page the site already served (e.g. via redirect).
    seed: Option<WebResponse>,
    last_response: Option<WebResponse>,
}

impl<'a> Login<'a> {
    pub fn new(ctx: SessionContext<'a>, credentials: &'a Credentials) -> Self {
        Self {
            ctx,
            credentials,
            state: LoginState::Anonymous,
            seed: None,
            last_response: None,
        }
    }

    /// Start from a login page already in hand instead of fetching one.
    pub fn seeded(mut self, login_page: WebResponse) -> Self {
        self.seed = Some(login_page);
        self
    }

    pub fn state(&self) -> &LoginState {
        &self.state
    }

    /// Run to a terminal state. Returns the final step's response.
    pub fn run(mut self) -> Result<WebResponse> {
        while !self.state.is_terminal() {
            let current = std::mem::replace(&mut self.state, LoginState::Failed);
            match self.advance(current) {
                Ok(next) => {
                    debug!("Login state -> {next}");
                    self.state = next;
                }
                Err(e) => {
                    debug!("Login state -> Failed ({e})");
                    return Err(e);
                }
            }
        }
        self.last_response
            .ok_or_else(|| Error::Session("login finished without a response".into()))
    }

    fn advance(&mut self, state: LoginState) -> Result<LoginState> {
        match state {
            LoginState::Anonymous => {
                let page = match self.seed.take() {
                    Some(page) => page,
                    None => self.ctx.session.send(&WebRequest::get(LOGIN_URL))?,
                };
                let token = self.ctx.parser.login_token(&page.body)?;
                Ok(LoginState::TokenIssued { token })
            }
            LoginState::TokenIssued { token } => {
                let res = self.ctx.session.send(
                    &WebRequest::post(LOGIN_URL)
                        .param("hl_vt", token.as_str())
                        .param("username", self.credentials.username())
                        .param("date-of-birth", self.credentials.date_of_birth()),
                )?;
                check_step(&res, LoginStep::UsernameAndDateOfBirth)?;
                Ok(LoginState::UsernameSubmitted {
                    token,
                    page: res.body,
                })
            }
            LoginState::UsernameSubmitted { token, page } => {
                let positions = match self.ctx.parser.secure_number_positions(&page) {
                    Ok(positions) => positions,
                    Err(_) => {
                        // Some journeys answer step one with a redirect
                        // shell; the digits are on the step-two page.
                        let res = self.ctx.session.send(&WebRequest::get(LOGIN_STEP_TWO_URL))?;
                        self.ctx.parser.secure_number_positions(&res.body)?
                    }
                };
                Ok(LoginState::NumbersRequested { token, positions })
            }
            LoginState::NumbersRequested { token, positions } => {
                self.ctx.pacer.pause_briefly();

                let mut request = WebRequest::post(LOGIN_STEP_TWO_URL)
                    .param("hl_vt", token.as_str())
                    .param("online-password-verification", self.credentials.password());
                for (i, position) in positions.iter().enumerate() {
                    let digit = self.credentials.secure_digit(*position)?;
                    request = request.param(format!("secure-number[{}]", i + 1), digit.to_string());
                }
                let request = request.param("submit", " Log in   ");

                let res = self.ctx.session.send(&request)?;
                check_step(&res, LoginStep::PasswordAndSecureNumber)?;

                let window_id = rand::rng().random_range(520_000..750_000);
                for cookie in cookies::logged_in_cookies(self.ctx.pacer.epoch_millis(), window_id) {
                    self.ctx.session.add_cookie(cookie);
                }
                self.last_response = Some(res);
                Ok(LoginState::Authenticated)
            }
            LoginState::Authenticated | LoginState::Failed => Ok(state),
        }
    }
}

fn check_step(res: &WebResponse, step: LoginStep) -> Result<()> {
    if !res.is_ok() {
        return Err(Error::Http {
            status: res.status,
            url: res.url.clone(),
        });
    }
    if res.contains(REJECTED_PHRASE) {
        return Err(AuthError::CredentialsRejected { step }.into());
    }
    Ok(())
}

/// True when `url` is the login page (ignoring any query string).
pub fn is_login_page(url: &str) -> bool {
    url.split(['?', '#']).next() == Some(LOGIN_URL)
}

/// Forget the logged-in cookies.
pub fn logout(ctx: SessionContext<'_>) {
    debug!("Logging out (cookies reset)");
    ctx.session.reset_cookies();
}
