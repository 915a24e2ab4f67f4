//! Application configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// File storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Custom-order questionnaire script.
    #[serde(default)]
    pub questionnaire: QuestionnaireConfig,
    /// Bootstrap administrator account.
    pub admin: AdminBootstrapConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this storefront.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Storage configuration for fulfilled bundles and catalog assets.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root directory holding one sub-directory per fulfilled order.
    #[serde(default = "default_websites_path")]
    pub websites_path: PathBuf,
    /// Directory for template images.
    #[serde(default = "default_assets_path")]
    pub assets_path: PathBuf,
    /// Public URL prefix for template images.
    #[serde(default = "default_assets_url")]
    pub assets_url: String,
    /// Largest accepted upload, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    /// Largest total size an uploaded archive may expand to, in bytes.
    #[serde(default = "default_max_extracted_bytes")]
    pub max_extracted_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            websites_path: default_websites_path(),
            assets_path: default_assets_path(),
            assets_url: default_assets_url(),
            max_upload_bytes: default_max_upload_bytes(),
            max_extracted_bytes: default_max_extracted_bytes(),
        }
    }
}

/// The scripted questionnaire used for custom orders.
///
/// Answers are positional: answer `i` responds to `questions[i]`. The budget
/// and website-name positions are configuration rather than literals, and
/// [`QuestionnaireConfig::validate`] checks them against the script length.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionnaireConfig {
    /// Script version, stored alongside every transcript.
    #[serde(default = "default_questionnaire_version")]
    pub version: u32,
    /// Ordered prompts.
    #[serde(default = "default_questions")]
    pub questions: Vec<String>,
    /// Position of the "what is your budget" prompt.
    #[serde(default = "default_budget_index")]
    pub budget_index: usize,
    /// Position of the brand/website name prompt.
    #[serde(default = "default_website_name_index")]
    pub website_name_index: usize,
}

impl Default for QuestionnaireConfig {
    fn default() -> Self {
        Self {
            version: default_questionnaire_version(),
            questions: default_questions(),
            budget_index: default_budget_index(),
            website_name_index: default_website_name_index(),
        }
    }
}

impl QuestionnaireConfig {
    /// Check that the answer positions point inside the script.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.questions.is_empty() {
            return Err(config::ConfigError::Message(
                "questionnaire.questions must not be empty".to_string(),
            ));
        }
        for (name, index) in [
            ("budget_index", self.budget_index),
            ("website_name_index", self.website_name_index),
        ] {
            if index >= self.questions.len() {
                return Err(config::ConfigError::Message(format!(
                    "questionnaire.{name} = {index} is outside a script of {} questions",
                    self.questions.len()
                )));
            }
        }
        Ok(())
    }
}

/// Credentials of the administrator seeded at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminBootstrapConfig {
    /// Admin login email.
    pub email: String,
    /// Admin password (hashed before it is stored).
    pub password: String,
    /// Admin display name.
    #[serde(default = "default_admin_name")]
    pub name: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

fn default_websites_path() -> PathBuf {
    PathBuf::from("./data/websites")
}

fn default_assets_path() -> PathBuf {
    PathBuf::from("./data/uploads")
}

fn default_assets_url() -> String {
    "/uploads".to_string()
}

const fn default_max_upload_bytes() -> u64 {
    16 * 1024 * 1024
}

const fn default_max_extracted_bytes() -> u64 {
    64 * 1024 * 1024
}

const fn default_questionnaire_version() -> u32 {
    1
}

const fn default_budget_index() -> usize {
    20
}

const fn default_website_name_index() -> usize {
    1
}

fn default_admin_name() -> String {
    "Main Admin".to_string()
}

fn default_questions() -> Vec<String> {
    [
        "What type of website are you looking for? (For example: E-commerce, Portfolio, Business, Blog)",
        "May I know your brand or business name?",
        "Do you already have a logo for your brand, or would you like us to design one?",
        "If you have a logo, is it final or are you open to improvements?",
        "What is the main purpose of this website? (Selling products, building trust, getting leads, sharing information)",
        "Anything else you would like to tell us about your business?",
        "Please describe your website idea in simple words, from A to Z.",
        "Do you prefer a modern, simple design or a premium, luxurious look?",
        "What is your timeline and urgency level for this project?",
        "Do you need ongoing maintenance and future updates after the website is completed?",
        "Who is your target audience for this website?",
        "Is mobile responsiveness a priority for your website?",
        "What language preference do you have for the website?",
        "Do you have any SEO or digital marketing expectations?",
        "Is there anything you really like or dislike in websites you have seen before?",
        "Do you have any reference websites that inspire you? If yes, please share the links.",
        "Please share your social media links so we can connect them with your website.",
        "Please provide an email address or phone number for updates and handover.",
        "Is all the information you provided correct?",
        "One more small question, if you don't mind.",
        "What is your budget? We will plan and work according to it.",
        "Thank you for your honesty. Any final notes?",
        "We will start planning your website based on your requirements. Anything to add?",
        "If you have any questions later, feel free to message us. Ready to place the order?",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (via dotenvy, if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `SITECRAFT_ENV`)
    /// 4. Environment variables with `SITECRAFT__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("SITECRAFT_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("SITECRAFT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.questionnaire.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("SITECRAFT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.questionnaire.validate()?;
        Ok(config)
    }
}
