use std::path::PathBuf;

use clap::Parser;
use http::{HeaderMap, HeaderName, HeaderValue};
use shibgate::{
    AuthError, ShibAuthenticator, ShibgateConfig,
    auth::{LoginOptions, LogoutOptions, RequestInfo},
    observability,
};

/// CLI arguments for shibgate
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Inspect Shibboleth login/logout URLs and attributes for a request",
    long_about = None
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to config file (defaults to built-in University of Minnesota settings)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

/// The request to simulate.
#[derive(clap::Args, Debug)]
struct RequestArgs {
    /// Host the client addressed
    #[arg(long)]
    host: String,

    /// Path and query of the request
    #[arg(long, default_value = "/")]
    path: String,

    /// Request header as `Name: value` (repeatable)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    headers: Vec<(HeaderName, HeaderValue)>,

    /// Override the attribute source (`from_headers` or `from_environment`)
    #[arg(long)]
    attribute_source: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Print the SP login URL
    LoginUrl {
        #[command(flatten)]
        request: RequestArgs,
        /// Where to return after login (defaults to the request URL)
        #[arg(long)]
        target: Option<String>,
        /// IdP entity ID
        #[arg(long)]
        entity_id: Option<String>,
        /// Force re-authentication at the IdP
        #[arg(long)]
        force_authn: bool,
        /// Passive login
        #[arg(long)]
        passive: bool,
        /// Require MKey authentication
        #[arg(long)]
        mkey: bool,
        /// Require Duo authentication (wins over --mkey)
        #[arg(long)]
        duo: bool,
    },
    /// Print the SP logout URL
    LogoutUrl {
        #[command(flatten)]
        request: RequestArgs,
        /// Where to land after logout
        #[arg(long = "return")]
        return_url: Option<String>,
        /// End only the local SP session, skipping the IdP logout page
        #[arg(long)]
        local_only: bool,
    },
    /// Print the resolved attributes as JSON
    Attributes {
        #[command(flatten)]
        request: RequestArgs,
        /// Extra attribute to resolve (repeatable)
        #[arg(short, long = "attribute")]
        attributes: Vec<String>,
        /// Extra attributes as a JSON array, e.g. '["mail","ou"]'
        #[arg(long)]
        requested_json: Option<String>,
        /// Print the login redirect instead when the session is missing or stale
        #[arg(long)]
        require_session: bool,
    },
}

fn parse_header(s: &str) -> Result<(HeaderName, HeaderValue), String> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| format!("expected 'Name: value', got '{s}'"))?;
    let name = HeaderName::from_bytes(name.trim().as_bytes())
        .map_err(|e| format!("invalid header name '{}': {e}", name.trim()))?;
    let value = HeaderValue::from_str(value.trim())
        .map_err(|e| format!("invalid header value for '{name}': {e}"))?;
    Ok((name, value))
}

fn build_authenticator(
    config: &ShibgateConfig,
    args: RequestArgs,
) -> Result<ShibAuthenticator, AuthError> {
    let mut headers = HeaderMap::new();
    for (name, value) in args.headers {
        headers.append(name, value);
    }

    let mut auth =
        ShibAuthenticator::from_config(RequestInfo::new(args.host, args.path, headers), &config.sso);
    if let Some(source) = &args.attribute_source {
        auth.set_attribute_access_method(source)?;
    }
    Ok(auth)
}

fn run(config: &ShibgateConfig, command: Command) -> Result<(), AuthError> {
    match command {
        Command::LoginUrl {
            request,
            target,
            entity_id,
            force_authn,
            passive,
            mkey,
            duo,
        } => {
            let auth = build_authenticator(config, request)?;
            let options = LoginOptions {
                target,
                entity_id,
                force_authn: force_authn.then_some(true),
                passive: passive.then_some(true),
                mkey: mkey.then_some(true),
                duo: duo.then_some(true),
                ..Default::default()
            };
            println!("{}", auth.build_login_url(Some(&options)));
        }
        Command::LogoutUrl {
            request,
            return_url,
            local_only,
        } => {
            let auth = build_authenticator(config, request)?;
            let options = LogoutOptions {
                logout_from_idp: local_only.then_some(false),
                return_url,
                ..Default::default()
            };
            println!("{}", auth.build_logout_url(Some(&options)));
        }
        Command::Attributes {
            request,
            attributes,
            requested_json,
            require_session,
        } => {
            let auth = build_authenticator(config, request)?;

            let mut requested = config.sso.requested_attributes.clone();
            requested.extend(attributes);
            if let Some(raw) = requested_json {
                let value: serde_json::Value = serde_json::from_str(&raw)
                    .map_err(|e| AuthError::InvalidArgument(format!("invalid JSON: {e}")))?;
                requested.extend(auth.attribute_names_from_value(&value)?);
            }

            let resolved = if require_session {
                auth.attributes_or_request_login(
                    None,
                    &requested,
                    Some(config.sso.session_max_age_secs),
                )?
            } else {
                auth.attributes(&requested)
            };

            match serde_json::to_string_pretty(&resolved) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Error: failed to serialize attributes: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match ShibgateConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        },
        None => ShibgateConfig::default(),
    };

    if let Err(e) = observability::init_tracing(&config.logging) {
        eprintln!("Warning: {e}");
    }

    match run(&config, args.command) {
        Ok(()) => {}
        Err(AuthError::LoginRequired { redirect_url }) => {
            tracing::info!("No valid Shibboleth session");
            println!("{redirect_url}");
            std::process::exit(3);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header() {
        let (name, value) = parse_header("Shib-Identity-Provider: urn:idp").unwrap();
        assert_eq!(name, "shib-identity-provider");
        assert_eq!(value, "urn:idp");
    }

    #[test]
    fn test_parse_header_rejects_missing_colon() {
        assert!(parse_header("uid jdoe").is_err());
    }

    #[test]
    fn test_args_parse_login_url() {
        let args = Args::try_parse_from([
            "shibgate",
            "login-url",
            "--host",
            "app.umn.edu",
            "--duo",
            "-H",
            "uid: jdoe",
        ])
        .unwrap();

        match args.command {
            Command::LoginUrl { request, duo, mkey, .. } => {
                assert_eq!(request.host, "app.umn.edu");
                assert_eq!(request.path, "/");
                assert_eq!(request.headers.len(), 1);
                assert!(duo);
                assert!(!mkey);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_run_rejects_unknown_attribute_source() {
        let args = Args::try_parse_from([
            "shibgate",
            "attributes",
            "--host",
            "app.umn.edu",
            "--attribute-source",
            "from_cookies",
        ])
        .unwrap();

        let err = run(&ShibgateConfig::default(), args.command).unwrap_err();
        assert!(matches!(err, AuthError::InvalidAttributeSource(_)));
    }

    #[test]
    fn test_run_requires_session() {
        let args = Args::try_parse_from([
            "shibgate",
            "attributes",
            "--host",
            "app.umn.edu",
            "--require-session",
        ])
        .unwrap();

        let err = run(&ShibgateConfig::default(), args.command).unwrap_err();
        assert!(matches!(err, AuthError::LoginRequired { .. }));
    }

    #[test]
    fn test_run_rejects_non_list_json() {
        let args = Args::try_parse_from([
            "shibgate",
            "attributes",
            "--host",
            "app.umn.edu",
            "--requested-json",
            "\"mail\"",
        ])
        .unwrap();

        let err = run(&ShibgateConfig::default(), args.command).unwrap_err();
        assert!(matches!(err, AuthError::InvalidArgument(_)));
    }
}
