// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "querykit";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".querykit";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "querykit.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "QUERYKIT_CONFIG";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "QUERYKIT_LOG";

// =============================================================================
// Filters
// =============================================================================

/// Largest accepted criteria document in bytes
pub const FILTERS_DEFAULT_MAX_JSON_BYTES: usize = 64 * 1024;

/// Most criteria accepted in one document
pub const FILTERS_DEFAULT_MAX_CRITERIA: usize = 50;

// =============================================================================
// SQLite Database
// =============================================================================

/// Environment variable for the SQLite database path
pub const ENV_DATABASE_PATH: &str = "QUERYKIT_DATABASE_PATH";

/// SQLite database filename
pub const SQLITE_DB_FILENAME: &str = "querykit.db";

/// SQLite connection pool max connections
pub const SQLITE_MAX_CONNECTIONS: u32 = 5;

/// SQLite busy timeout in seconds
pub const SQLITE_BUSY_TIMEOUT_SECS: u64 = 30;

/// SQLite cache size (negative = KB, so -16000 = 16MB)
pub const SQLITE_CACHE_SIZE: &str = "-16000";

// =============================================================================
// Files
// =============================================================================

/// Environment variable for the file storage backend
pub const ENV_FILES_STORAGE: &str = "QUERYKIT_FILES_STORAGE";

/// Environment variable for the filesystem storage root
pub const ENV_FILES_PATH: &str = "QUERYKIT_FILES_PATH";

/// Environment variable for the S3 bucket
pub const ENV_FILES_S3_BUCKET: &str = "QUERYKIT_FILES_S3_BUCKET";

/// Environment variable for file URL expiry
pub const ENV_FILES_URL_EXPIRY_SECS: &str = "QUERYKIT_FILES_URL_EXPIRY_SECS";

/// Default object key prefix
pub const FILES_DEFAULT_PREFIX: &str = "files";

/// Default filesystem storage directory (relative to the working directory)
pub const FILES_DEFAULT_PATH: &str = "./data/files";

/// Default lifetime of presigned URLs
pub const FILES_DEFAULT_URL_EXPIRY_SECS: u64 = 15 * 60;

/// Longest presigned URL lifetime S3 accepts (SigV4, one week)
pub const FILES_MAX_URL_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;
