//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量读取；未设置时使用默认值。

use std::env;
use std::fmt;

/// 环境变量解析错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "MHTML_LOG_LEVEL";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn parse(value: &str) -> EnvResult<String> {
            match value.trim().to_lowercase().as_str() {
                level @ ("trace" | "debug" | "info" | "warn" | "error") => Ok(level.to_string()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }
}

/// 归档转换相关环境变量
pub mod archive {
    use super::*;
    use crate::core::{DEFAULT_MAX_DEPTH, MHTML_RESOURCE_PREFIX};

    /// 资源地址前缀
    pub struct ResourcePrefix;
    impl EnvVar<String> for ResourcePrefix {
        const NAME: &'static str = "MHTML_RESOURCE_PREFIX";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok(MHTML_RESOURCE_PREFIX.to_string()),
            }
        }
        const DESCRIPTION: &'static str =
            "URL path prefix under which cached archive resources are served";

        fn parse(value: &str) -> EnvResult<String> {
            let prefix = value.trim();
            if !prefix.starts_with('/') {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!("Prefix '{}' must start with '/'", prefix),
                });
            }
            if prefix.len() > 1 && prefix.ends_with('/') {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!("Prefix '{}' must not end with '/'", prefix),
                });
            }
            if prefix.contains(['?', '#', ' ']) {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!("Prefix '{}' must be a plain URL path", prefix),
                });
            }
            Ok(prefix.to_string())
        }
    }

    /// 多部分嵌套层数上限
    pub struct MaxDepth;
    impl EnvVar<usize> for MaxDepth {
        const NAME: &'static str = "MHTML_MAX_DEPTH";
        const DEFAULT: Option<usize> = Some(DEFAULT_MAX_DEPTH);
        const DESCRIPTION: &'static str = "Maximum number of nested multipart levels in an archive";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value.trim(), Self::NAME, 1, 256)
        }
    }
}

fn parse_positive_usize(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<usize> {
    let num: usize = value.parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables\n\n");
    docs.push_str(&format!(
        "- `{}`: {} (default: {})\n",
        core::LogLevel::NAME,
        core::LogLevel::DESCRIPTION,
        "info"
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {})\n",
        archive::ResourcePrefix::NAME,
        archive::ResourcePrefix::DESCRIPTION,
        crate::core::MHTML_RESOURCE_PREFIX
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {})\n",
        archive::MaxDepth::NAME,
        archive::MaxDepth::DESCRIPTION,
        crate::core::DEFAULT_MAX_DEPTH
    ));
    docs
}
