use anyhow::{Context, Result, bail};
use img_rev_searcher::{ImageInput, ReverseSearchEngine, SearchConfig, SearchParameters, logging};
use serde_json::Value;
use std::env;
use std::path::{Path, PathBuf};

const CONFIG_ENV: &str = "IMG_REV_SEARCHER_CONFIG";
const DEFAULT_CONFIG: &str = "./searcher.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let mut args: Vec<String> = env::args().skip(1).collect();
    let verbose = take_flag(&mut args, &["-v", "--verbose"]);
    logging::init(verbose);

    match args.first().map(String::as_str) {
        Some("search") => run_search(&args[1..]).await?,
        Some("engines") => print_engines(),
        Some("--help" | "-h") | None => print_help(),
        Some(other) => {
            println!("未知命令: {}", other);
            print_help();
        }
    }

    Ok(())
}

/// 移除旗標並回傳是否存在
fn take_flag(args: &mut Vec<String>, names: &[&str]) -> bool {
    let before = args.len();
    args.retain(|arg| !names.contains(&arg.as_str()));
    args.len() != before
}

fn load_config() -> Result<SearchConfig> {
    if let Ok(path) = env::var(CONFIG_ENV) {
        return SearchConfig::load(&path);
    }
    if Path::new(DEFAULT_CONFIG).exists() {
        return SearchConfig::load(DEFAULT_CONFIG);
    }
    Ok(SearchConfig::default())
}

/// `key=value`，value 能當 JSON 解析就用 JSON（數字、布林、陣列）
fn parse_params(pairs: &[String]) -> Result<SearchParameters> {
    let mut params = SearchParameters::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("參數格式錯誤（應為 key=value）: {}", pair);
        };
        let value =
            serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
        params.insert(key.trim().to_string(), value);
    }
    Ok(params)
}

fn image_input(target: &str) -> ImageInput {
    if target.starts_with("http://") || target.starts_with("https://") {
        ImageInput::from_url(target)
    } else {
        ImageInput::from_file(PathBuf::from(target))
    }
}

async fn run_search(args: &[String]) -> Result<()> {
    let [engine, target, rest @ ..] = args else {
        print_help();
        return Ok(());
    };

    let config = load_config().context("載入設定失敗")?;
    let params = parse_params(rest)?;

    println!("🔎 使用 {} 搜尋: {}\n", engine, target);
    let engine_runner = ReverseSearchEngine::new(config);
    engine_runner.search_and_print(engine, image_input(target), &params).await;
    Ok(())
}

fn print_engines() {
    println!("支援的搜尋引擎:");
    for name in ReverseSearchEngine::supported_engines() {
        println!("  - {}", name);
    }
}

fn print_help() {
    println!("img-rev-searcher - 以圖搜圖工具\n");
    println!("用法:");
    println!("  img-rev-searcher search <engine> <file|url> [key=value ...]  # 搜尋");
    println!("  img-rev-searcher engines                                     # 列出引擎");
    println!("  img-rev-searcher --help                                      # 顯示此幫助\n");
    println!("選項:");
    println!("  -v, --verbose   顯示除錯訊息\n");
    println!("範例:");
    println!("  img-rev-searcher search saucenao ./a.jpg api_key=xxxx numres=3");
    println!(
        "  img-rev-searcher search google https://example.com/a.jpg search_type=visual_matches"
    );
    println!("  img-rev-searcher search ehentai ./cover.png similar=false covers=true\n");
    println!("設定檔:");
    println!("  ${} 或 {} (TOML)", CONFIG_ENV, DEFAULT_CONFIG);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_params_types() {
        let params = parse_params(&[
            "numres=3".to_string(),
            "similar=false".to_string(),
            "api_key=abc".to_string(),
            "dbs=[5,41]".to_string(),
        ])
        .unwrap();
        assert_eq!(params["numres"], json!(3));
        assert_eq!(params["similar"], json!(false));
        assert_eq!(params["api_key"], json!("abc"));
        assert_eq!(params["dbs"], json!([5, 41]));
        assert!(parse_params(&["oops".to_string()]).is_err());
    }

    #[test]
    fn test_take_flag() {
        let mut args = vec!["search".to_string(), "-v".to_string(), "bing".to_string()];
        assert!(take_flag(&mut args, &["-v", "--verbose"]));
        assert_eq!(args, vec!["search", "bing"]);
        assert!(!take_flag(&mut args, &["-v"]));
    }

    #[test]
    fn test_image_input_kind() {
        assert!(image_input("https://example.com/a.jpg").url.is_some());
        assert!(image_input("./a.jpg").file.is_some());
    }
}
