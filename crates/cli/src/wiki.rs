//! Wiki CLI commands: login and node listing.
//!
//! `wikisync login`   — verify app credentials, save them locally
//! `wikisync logout`  — delete saved credentials
//! `wikisync nodes`   — list space nodes so the user can pick a parent token

use std::io::{self, Write};
use std::time::Duration;

use wikisync_config::Settings;
use wikisync_wiki_client::{
    delete_auth, load_auth, save_auth, AppCredentials, ClientOptions, WikiClient, WikiError,
};

use crate::exit_codes::*;
use crate::CliError;

// ── Login ───────────────────────────────────────────────────────────

pub fn cmd_login(
    app_id: Option<String>,
    app_secret: Option<String>,
    api_base: Option<String>,
) -> Result<(), CliError> {
    // Resolve each credential: flag > env (via clap) > interactive prompt
    let app_id = resolve_credential(app_id, "application id")?;
    let app_secret = resolve_credential(app_secret, "application secret")?;
    let api_base = api_base.unwrap_or_else(|| Settings::load().api_base);

    let creds = AppCredentials::new(app_id, app_secret, api_base);
    let mut client = WikiClient::new(creds.clone());

    // Verify the credentials by acquiring a token
    client.ensure_token().map_err(|e| match e {
        WikiError::Api(code, msg) => CliError {
            code: EXIT_WIKI_AUTH,
            message: format!("Credentials rejected ({}): {}", code, msg),
            hint: Some("check the app id and secret in the platform's developer console".into()),
        },
        WikiError::Network(msg) => CliError {
            code: EXIT_WIKI_NETWORK,
            message: format!("Cannot reach wiki service: {}", msg),
            hint: None,
        },
        other => wiki_error(other),
    })?;

    save_auth(&creds).map_err(|e| CliError {
        code: EXIT_ERROR,
        message: e,
        hint: None,
    })?;

    eprintln!("Authenticated (token acquired, credentials saved)");
    Ok(())
}

fn resolve_credential(flag: Option<String>, what: &str) -> Result<String, CliError> {
    if let Some(v) = flag {
        let trimmed = v.trim().to_string();
        if !trimmed.is_empty() {
            return Ok(trimmed);
        }
    }

    if atty::is(atty::Stream::Stdin) {
        eprint!("{}: ", what);
        io::stderr().flush().ok();
        let mut buf = String::new();
        io::stdin()
            .read_line(&mut buf)
            .map_err(|e| CliError { code: EXIT_ERROR, message: e.to_string(), hint: None })?;
        let trimmed = buf.trim().to_string();
        if !trimmed.is_empty() {
            return Ok(trimmed);
        }
    }

    Err(CliError::usage(format!("No {} provided", what))
        .with_hint("pass --app-id/--app-secret or set WIKISYNC_APP_ID / WIKISYNC_APP_SECRET"))
}

// ── Logout ──────────────────────────────────────────────────────────

pub fn cmd_logout() -> Result<(), CliError> {
    delete_auth().map_err(|e| CliError { code: EXIT_ERROR, message: e, hint: None })?;
    eprintln!("Credentials removed");
    Ok(())
}

// ── Nodes ───────────────────────────────────────────────────────────

pub fn cmd_nodes(space: Option<String>) -> Result<(), CliError> {
    let settings = Settings::load();
    let space = crate::sync::resolve_target(
        space,
        &settings.space_id,
        "--space",
        wikisync_config::settings::ENV_SPACE_ID,
    )?;

    let mut client = resolve_client(&settings)?;
    let nodes = client.list_nodes(&space).map_err(wiki_error)?;

    println!("Nodes in space {}:", space);
    println!("{}", "-".repeat(50));
    for node in &nodes {
        println!("title:        {}", node.title);
        println!("node_token:   {}", node.node_token);
        println!("obj_type:     {}", node.obj_type);
        if let Some(parent) = &node.parent_node_token {
            println!("parent_token: {}", parent);
        }
        println!("{}", "-".repeat(50));
    }

    eprintln!();
    eprintln!("Pick the node to upload under, copy its node_token, and set it as");
    eprintln!("wiki.parentNodeToken in settings.json (or WIKISYNC_PARENT_NODE).");
    Ok(())
}

// ── Shared helpers ──────────────────────────────────────────────────

/// Build a client from env credentials (preferred) or the saved auth file,
/// carrying the configured transport options.
pub(crate) fn resolve_client(settings: &Settings) -> Result<WikiClient, CliError> {
    let creds = match env_credentials() {
        Some((app_id, app_secret)) => {
            AppCredentials::new(app_id, app_secret, settings.api_base.clone())
        }
        None => load_auth().ok_or(CliError {
            code: EXIT_WIKI_NOT_AUTH,
            message: "Not authenticated".into(),
            hint: Some("run `wikisync login` first".into()),
        })?,
    };

    let opts = ClientOptions {
        timeout: Duration::from_secs(settings.timeout_secs),
        insecure_tls: settings.insecure_tls,
        ..ClientOptions::default()
    };

    Ok(WikiClient::with_options(creds, opts))
}

fn env_credentials() -> Option<(String, String)> {
    let id = std::env::var("WIKISYNC_APP_ID").ok()?.trim().to_string();
    let secret = std::env::var("WIKISYNC_APP_SECRET").ok()?.trim().to_string();
    if id.is_empty() || secret.is_empty() {
        return None;
    }
    Some((id, secret))
}

/// Map a client error to a CLI error with the right exit code.
pub(crate) fn wiki_error(e: WikiError) -> CliError {
    let code = match &e {
        WikiError::NotAuthenticated => EXIT_WIKI_NOT_AUTH,
        WikiError::Http(401, _) | WikiError::Http(403, _) => EXIT_WIKI_AUTH,
        WikiError::Api(_, _) => EXIT_WIKI_REMOTE,
        WikiError::Network(_) | WikiError::Http(_, _) | WikiError::Parse(_) => EXIT_WIKI_NETWORK,
        WikiError::Io(_) | WikiError::EmptyDocument(_) => EXIT_ERROR,
    };
    let hint = match &e {
        WikiError::NotAuthenticated => Some("run `wikisync login` first".to_string()),
        _ => None,
    };
    CliError { code, message: e.to_string(), hint }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wiki_error_exit_codes() {
        assert_eq!(wiki_error(WikiError::NotAuthenticated).code, EXIT_WIKI_NOT_AUTH);
        assert_eq!(wiki_error(WikiError::Http(401, "no".into())).code, EXIT_WIKI_AUTH);
        assert_eq!(wiki_error(WikiError::Http(403, "no".into())).code, EXIT_WIKI_AUTH);
        assert_eq!(wiki_error(WikiError::Http(503, "down".into())).code, EXIT_WIKI_NETWORK);
        assert_eq!(wiki_error(WikiError::Network("refused".into())).code, EXIT_WIKI_NETWORK);
        assert_eq!(wiki_error(WikiError::Api(1, "bad parent".into())).code, EXIT_WIKI_REMOTE);
        assert_eq!(wiki_error(WikiError::Io("gone".into())).code, EXIT_ERROR);
    }

    #[test]
    fn test_wiki_error_not_auth_hint() {
        let e = wiki_error(WikiError::NotAuthenticated);
        assert!(e.hint.unwrap().contains("wikisync login"));
    }

    #[test]
    fn test_wiki_error_message_carries_service_msg() {
        let e = wiki_error(WikiError::Api(1, "bad parent".into()));
        assert!(e.message.contains("bad parent"));
    }

    #[test]
    fn test_resolve_credential_flag() {
        let v = resolve_credential(Some("  cli_abc  ".into()), "application id").unwrap();
        assert_eq!(v, "cli_abc");
    }
}
