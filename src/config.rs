//! Test environment configuration

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

/// Capabilities the protocol server advertises by default.
const DEFAULT_CAPABILITIES: &[&str] = &[
    "ID",
    "STARTTLS",
    "AUTH-PLAIN",
    "SPECIAL-USE",
    "NAMESPACE",
    "IDLE",
    "SASL-IR",
    "ENABLE",
    "LITERALPLUS",
    "UNSELECT",
    "CONDSTORE",
];

/// One node in the folder hierarchy handed to the protocol server.
///
/// A node either describes a mailbox (special-use tag plus type) or
/// groups nested folders under a namespace prefix.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolderNode {
    #[serde(rename = "special-use", skip_serializing_if = "Option::is_none")]
    pub special_use: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub folders: BTreeMap<String, FolderNode>,
}

impl FolderNode {
    /// A personal mailbox carrying the given special-use tag.
    #[must_use]
    pub fn special_use(tag: &str) -> Self {
        Self {
            special_use: Some(tag.to_string()),
            kind: Some("personal".to_string()),
            folders: BTreeMap::new(),
        }
    }

    /// A namespace node grouping nested folders.
    #[must_use]
    pub const fn group(folders: BTreeMap<String, FolderNode>) -> Self {
        Self {
            special_use: None,
            kind: None,
            folders,
        }
    }
}

/// TLS key and certificate material handed to the protocol server.
///
/// The controller treats both as opaque bytes; the server collaborator
/// is the one that interprets them.
#[derive(Debug, Clone)]
pub struct TlsMaterial {
    pub key: Vec<u8>,
    pub cert: Vec<u8>,
}

impl TlsMaterial {
    /// Load key and certificate from PEM files.
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be read.
    pub fn from_pem_files(key: impl AsRef<Path>, cert: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            key: std::fs::read(key)?,
            cert: std::fs::read(cert)?,
        })
    }
}

/// Configuration for one test environment.
#[derive(Debug, Clone)]
pub struct TestbedConfig {
    /// Backing store connection string.
    pub connection: String,
    /// Collection the environment stores messages in.
    pub message_collection: String,
    /// Collection the environment stores users in.
    pub user_collection: String,
    /// Directory message attachments are written to. Created on start,
    /// removed on stop.
    pub attachments_path: PathBuf,
    /// Port the protocol server listens on.
    pub port: u16,
    /// Identity the server reports (ID capability, greeting).
    pub server_name: String,
    pub capabilities: Vec<String>,
    pub folders: BTreeMap<String, FolderNode>,
    pub tls: Option<TlsMaterial>,
    /// Whether the server requires TLS from the first byte rather than
    /// upgrading via STARTTLS.
    pub secure_connection: bool,
    pub test_user_email: String,
    pub test_user_password: String,
}

impl TestbedConfig {
    /// Configuration with the stock defaults for a local backing
    /// store: `emails_test`/`users_test` collections, port 143, the
    /// standard folder hierarchy, and `testuser@localhost`.
    #[must_use]
    pub fn new(connection: impl Into<String>) -> Self {
        Self {
            connection: connection.into(),
            message_collection: "emails_test".to_string(),
            user_collection: "users_test".to_string(),
            attachments_path: PathBuf::from("./attachments"),
            port: 143,
            server_name: "localhost".to_string(),
            capabilities: DEFAULT_CAPABILITIES
                .iter()
                .copied()
                .map(String::from)
                .collect(),
            folders: Self::default_folders(),
            tls: None,
            secure_connection: false,
            test_user_email: "testuser@localhost".to_string(),
            test_user_password: "testpass".to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads from `.env` file if present. All variables are optional,
    /// with defaults matching [`TestbedConfig::new`]:
    /// - `TESTBED_CONNECTION` (default: `localhost:27017/localhost`)
    /// - `TESTBED_PORT` (default: `143`)
    /// - `TESTBED_ATTACHMENTS_PATH` (default: `./attachments`)
    /// - `TESTBED_USER_EMAIL` (default: `testuser@localhost`)
    /// - `TESTBED_USER_PASSWORD` (default: `testpass`)
    ///
    /// # Errors
    ///
    /// Returns an error if `TESTBED_PORT` is not a valid port number.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let connection =
            env::var("TESTBED_CONNECTION").unwrap_or_else(|_| "localhost:27017/localhost".into());
        let mut config = Self::new(connection);

        config.port = env::var("TESTBED_PORT")
            .unwrap_or_else(|_| "143".to_string())
            .parse()
            .map_err(|e| Error::Config(format!("Invalid TESTBED_PORT: {e}")))?;
        if let Ok(path) = env::var("TESTBED_ATTACHMENTS_PATH") {
            config.attachments_path = PathBuf::from(path);
        }
        if let Ok(email) = env::var("TESTBED_USER_EMAIL") {
            config.test_user_email = email;
        }
        if let Ok(password) = env::var("TESTBED_USER_PASSWORD") {
            config.test_user_password = password;
        }

        Ok(config)
    }

    /// The stock folder hierarchy: INBOX at the top level, the other
    /// special-use mailboxes nested under the empty namespace.
    #[must_use]
    pub fn default_folders() -> BTreeMap<String, FolderNode> {
        let mut nested = BTreeMap::new();
        nested.insert("Drafts".to_string(), FolderNode::special_use("\\Drafts"));
        nested.insert("Sent".to_string(), FolderNode::special_use("\\Sent"));
        nested.insert("Junk".to_string(), FolderNode::special_use("\\Junk"));
        nested.insert("Trash".to_string(), FolderNode::special_use("\\Trash"));

        let mut folders = BTreeMap::new();
        folders.insert("INBOX".to_string(), FolderNode::special_use("\\Inbox"));
        folders.insert(String::new(), FolderNode::group(nested));
        folders
    }

    /// The options bundle handed to the storage engine on start.
    #[must_use]
    pub fn storage_options(&self) -> StorageOptions {
        StorageOptions {
            name: self.server_name.clone(),
            connection: self.connection.clone(),
            message_collection: self.message_collection.clone(),
            user_collection: self.user_collection.clone(),
            attachments_path: self.attachments_path.clone(),
        }
    }

    /// The options bundle handed to the protocol server on start.
    #[must_use]
    pub fn server_options(&self) -> ServerOptions {
        ServerOptions {
            name: self.server_name.clone(),
            capabilities: self.capabilities.clone(),
            folders: self.folders.clone(),
            tls: self.tls.clone(),
            secure_connection: self.secure_connection,
        }
    }
}

/// Options the storage engine is initialized with.
#[derive(Debug, Clone)]
pub struct StorageOptions {
    pub name: String,
    pub connection: String,
    pub message_collection: String,
    pub user_collection: String,
    pub attachments_path: PathBuf,
}

/// Configuration bundle for the protocol server.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub name: String,
    pub capabilities: Vec<String>,
    pub folders: BTreeMap<String, FolderNode>,
    pub tls: Option<TlsMaterial>,
    pub secure_connection: bool,
}
