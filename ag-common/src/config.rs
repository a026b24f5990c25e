use once_cell::sync::OnceCell;
use std::env;

/// spec.md §2: "combined mode the server calls the grading engine inline
/// and the queue is not used" vs. the asynchronous dispatch-over-queue
/// deployment variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradingMode {
    Combined,
    Async,
}

impl GradingMode {
    fn from_env() -> Self {
        match env::var("GRADING_MODE").as_deref() {
            Ok("async") | Ok("Async") => GradingMode::Async,
            _ => GradingMode::Combined,
        }
    }
}

/// Process-wide configuration, loaded once from the environment.
///
/// Mirrors the teacher's `common::config::Config` singleton, but carries
/// the env vars this system actually reads (spec.md §6) instead of the
/// database/JWT settings the teacher's API needs.
#[derive(Debug, Clone)]
pub struct Config {
    pub project_name: String,
    pub log_level: String,
    pub port: u16,
    pub server_url: String,
    pub upload_dir: String,
    pub scratch_root: String,
    pub asset_root: String,
    /// Path to the external sandboxing binary (spec.md §4.4, §1: "the
    /// process sandbox binary (consumed as a black-box executable...)").
    pub sandbox_binary: String,
    /// `combined` (grade inline) or `async` (dispatch over the queue)
    /// deployment mode (spec.md §2).
    pub grading_mode: GradingMode,
    /// Broker connection string for `async` mode (spec.md §1: the message
    /// broker is an external collaborator; `ag-queue`'s in-memory channel
    /// is used instead whenever this is unset, e.g. in `combined` mode and
    /// in tests). Decision recorded in DESIGN.md.
    pub queue_url: Option<String>,
    /// spec.md §3 Submission lifecycle: "scratch directory deleted (unless
    /// disable-cleanup is set)".
    pub disable_cleanup: bool,
    /// spec.md §4.5 step e: include the raw sandboxed-run log inside
    /// rendered inline-test HTML fragments.
    pub include_logs: bool,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Not named in spec.md's env-var table, but required for OIDC
    /// discovery (spec.md §4.6 "exchanges the authorization code..." implies
    /// a provider to discover against). Decision recorded in DESIGN.md.
    pub oidc_issuer_url: Option<String>,
    pub cookie_auth_key: Option<String>,
    pub cookie_encrypt_key: Option<String>,
    pub hash_salt: String,
    pub log_bucket: Option<String>,
    pub jwt_key: Option<String>,
    /// Comma-separated allow-list of emails (spec.md §4.6 "rejects users not
    /// in the allow-list"); spec.md doesn't name the variable carrying it.
    /// Decision recorded in DESIGN.md.
    pub allowed_emails: Vec<String>,
}

static CONFIG: OnceCell<Config> = OnceCell::new();

impl Config {
    /// Loads `.env` (if present) and reads the environment once. Subsequent
    /// calls return the cached instance, same contract as the teacher's
    /// `Config::init`.
    pub fn init(env_path: &str) -> &'static Self {
        dotenvy::from_filename(env_path).ok();

        CONFIG.get_or_init(|| {
            let project_name =
                env::var("PROJECT_NAME").unwrap_or_else(|_| "autograder".into());
            let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into());
            let port = env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080);
            let server_url =
                env::var("SERVER_URL").unwrap_or_else(|_| format!("http://localhost:{port}"));
            let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".into());
            let scratch_root = env::var("SCRATCH_ROOT").unwrap_or_else(|_| "scratch".into());
            let asset_root = env::var("ASSET_ROOT").unwrap_or_else(|_| "assets".into());
            let hash_salt = env::var("HASH_SALT").unwrap_or_else(|_| "dev-salt".into());
            let sandbox_binary =
                env::var("SANDBOX_BINARY").unwrap_or_else(|_| "/usr/local/bin/sandbox".into());

            Config {
                project_name,
                log_level,
                port,
                server_url,
                upload_dir,
                scratch_root,
                asset_root,
                sandbox_binary,
                grading_mode: GradingMode::from_env(),
                queue_url: env::var("QUEUE_URL").ok(),
                disable_cleanup: env::var("AUTOGRADER_DISABLE_CLEANUP")
                    .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                    .unwrap_or(false),
                include_logs: env::var("AUTOGRADER_INCLUDE_LOGS")
                    .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                    .unwrap_or(false),
                client_id: env::var("CLIENT_ID").ok(),
                client_secret: env::var("CLIENT_SECRET").ok(),
                oidc_issuer_url: env::var("OIDC_ISSUER_URL").ok(),
                cookie_auth_key: env::var("COOKIE_AUTH_KEY").ok(),
                cookie_encrypt_key: env::var("COOKIE_ENCRYPT_KEY").ok(),
                hash_salt,
                log_bucket: env::var("LOG_BUCKET").ok(),
                jwt_key: env::var("JWT_KEY").ok(),
                allowed_emails: env::var("ALLOWED_EMAILS")
                    .ok()
                    .map(|raw| {
                        raw.split(',')
                            .map(|s| s.trim().to_lowercase())
                            .filter(|s| !s.is_empty())
                            .collect()
                    })
                    .unwrap_or_default(),
            }
        })
    }

    pub fn get() -> &'static Self {
        CONFIG.get().expect("Config not initialized")
    }

    /// True when authentication (OIDC) has been configured.
    pub fn auth_enabled(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }
}
