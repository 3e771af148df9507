//! Info about an extraction session.

use wmlx_errors::{ColorConfig, Handler};

/// Session state shared by the scanner and the expansion driver: the
/// diagnostics handler and the textdomain applied until a `#textdomain`
/// directive overrides it.
pub struct ScanSession {
    pub diagnostic: Handler,
    pub default_domain: String,
}

impl ScanSession {
    pub fn new<S: Into<String>>(default_domain: S) -> ScanSession {
        let handler = Handler::with_tty_emitter(ColorConfig::Auto, true);
        ScanSession::with_handler(handler, default_domain)
    }

    pub fn with_handler<S: Into<String>>(handler: Handler, default_domain: S) -> ScanSession {
        ScanSession {
            diagnostic: handler,
            default_domain: default_domain.into(),
        }
    }

    pub fn handler(&self) -> &Handler {
        &self.diagnostic
    }
}
