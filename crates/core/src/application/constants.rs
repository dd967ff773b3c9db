// Gateway constants: header names, separators and input keys

/// Reserved CLI command key resolved to the running interpreter
pub const INTERPRETER_ALIAS: &str = "PHP";

/// CORS response headers
pub const HEADER_ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";
pub const HEADER_ALLOW_HEADERS: &str = "Access-Control-Allow-Headers";
pub const HEADER_ALLOW_CREDENTIALS: &str = "Access-Control-Allow-Credentials";

/// MIME header written at FLUSH
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";

/// Input keys that carry the command instead of data
pub const COMMAND_KEYS: [&str; 2] = ["c", "cmd"];

/// Separators understood by the command preparer
pub const JOB_SEPARATOR: char = '|';
pub const METHOD_SEPARATOR: char = '-';

/// Input keys that feed CLI options for prepared CLI jobs
pub const CLI_ARGV_KEY: &str = "argv";
pub const CLI_PIPE_KEY: &str = "pipe";
pub const CLI_TIME_KEY: &str = "time";
pub const CLI_RET_KEY: &str = "ret";
