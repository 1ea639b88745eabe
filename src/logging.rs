use tracing_subscriber::EnvFilter;

/// 初始化 tracing，輸出到 stderr
///
/// `RUST_LOG` 有設定時以它為準；否則預設只顯示本 crate 的 info。
pub fn init(verbose: bool) {
    let default_filter = if verbose {
        "img_rev_searcher=debug,warn"
    } else {
        "img_rev_searcher=info,warn"
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .try_init()
        .ok(); // 已初始化時（例如測試）不 panic
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_init_twice_is_harmless() {
        super::init(false);
        super::init(true);
        tracing::info!("logging initialised twice");
    }
}
