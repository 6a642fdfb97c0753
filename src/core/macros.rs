//! 核心宏定义
//!
//! 提供统一的宏来减少代码重复

/// 为结构体实现Default trait的宏
///
/// 使用示例:
/// ```rust
/// use player_runtime::impl_default;
///
/// struct FetchLimits {
///     timeout_ms: u64,
///     label: String,
/// }
///
/// impl_default!(FetchLimits {
///     timeout_ms: 30_000,
///     label: String::from("builtin"),
/// });
///
/// assert_eq!(FetchLimits::default().timeout_ms, 30_000);
/// ```
#[macro_export]
macro_rules! impl_default {
    ($struct_name:ident {
        $($field:ident: $value:expr),* $(,)?
    }) => {
        impl Default for $struct_name {
            fn default() -> Self {
                Self {
                    $($field: $value),*
                }
            }
        }
    };
}

/// 同时实现Default和new()的宏
#[macro_export]
macro_rules! impl_default_and_new {
    ($struct_name:ident {
        $($field:ident: $value:expr),* $(,)?
    }) => {
        impl Default for $struct_name {
            fn default() -> Self {
                Self {
                    $($field: $value),*
                }
            }
        }

        impl $struct_name {
            pub fn new() -> Self {
                Self::default()
            }
        }
    };
}

#[cfg(test)]
mod tests {
    #[derive(Debug)]
    struct SessionCounters {
        dispatched: u32,
        origin: String,
    }

    impl_default_and_new!(SessionCounters {
        dispatched: 0,
        origin: String::new(),
    });

    #[test]
    fn test_impl_default_and_new() {
        let a = SessionCounters::default();
        let b = SessionCounters::new();

        assert_eq!(a.dispatched, 0);
        assert_eq!(a.origin, "");
        assert_eq!(b.dispatched, 0);
    }
}
