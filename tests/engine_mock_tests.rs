//! 以 wiremock 模擬各引擎的 HTTP 往返

use img_rev_searcher::fetcher::{HttpFetcher, TransportOptions};
use img_rev_searcher::types::ImageFile;
use img_rev_searcher::{ErrorKind, ImageInput};

fn fetcher() -> HttpFetcher {
    HttpFetcher::new(&TransportOptions::default()).expect("fetcher")
}

fn jpeg_bytes() -> Vec<u8> {
    vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F']
}

/// multipart 內含二進位資料，不能當 UTF-8 字串比對
fn body_contains(body: &[u8], needle: &str) -> bool {
    body.windows(needle.len()).any(|w| w == needle.as_bytes())
}

mod input_validation_tests {
    use super::*;
    use img_rev_searcher::ReverseSearchService;
    use img_rev_searcher::reverse_search::services::{
        AnimeTraceService, BaiDuService, BingService, CopyseekerService, EHentaiService,
        GoogleLensService, SauceNaoService, TinEyeService,
    };
    use img_rev_searcher::reverse_search::services::google::GoogleLensParams;
    use img_rev_searcher::reverse_search::services::saucenao::SauceNaoParams;

    fn all_services() -> Vec<Box<dyn ReverseSearchService>> {
        let saucenao = SauceNaoParams {
            api_key: Some("test-key".into()),
            ..SauceNaoParams::default()
        };
        // 無法連線的位址，確保驗證在任何請求之前
        let dead = "http://127.0.0.1:9";
        vec![
            Box::new(AnimeTraceService::new(fetcher(), Default::default()).with_base_url(dead)),
            Box::new(BaiDuService::new(fetcher()).with_base_url(dead)),
            Box::new(BingService::new(fetcher()).with_base_url(dead)),
            Box::new(CopyseekerService::new(fetcher()).with_base_url(dead)),
            Box::new(EHentaiService::new(fetcher(), Default::default()).with_base_url(dead)),
            Box::new(
                GoogleLensService::new(fetcher(), GoogleLensParams::default())
                    .unwrap()
                    .with_base_url(dead),
            ),
            Box::new(SauceNaoService::new(fetcher(), saucenao).unwrap().with_base_url(dead)),
            Box::new(TinEyeService::new(fetcher(), Default::default()).with_base_url(dead)),
        ]
    }

    #[tokio::test]
    async fn test_every_engine_rejects_missing_input() {
        for service in all_services() {
            let err = service.search(&ImageInput::default()).await.err().unwrap();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "engine {}", service.name());
        }
    }

    #[tokio::test]
    async fn test_every_engine_rejects_both_inputs() {
        let both = ImageInput {
            url: Some("https://example.com/a.jpg".into()),
            file: Some(ImageFile::Bytes(jpeg_bytes())),
        };
        for service in all_services() {
            let err = service.search(&both).await.err().unwrap();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "engine {}", service.name());
        }
    }
}

mod saucenao_tests {
    use super::*;
    use img_rev_searcher::reverse_search::services::SauceNaoService;
    use img_rev_searcher::reverse_search::services::saucenao::SauceNaoParams;
    use img_rev_searcher::{
        EngineKind, EngineResponse, ReverseSearchEngine, SearchConfig, SearchParameters,
    };
    use serde_json::json;
    use wiremock::matchers::{header_regex, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn payload() -> serde_json::Value {
        json!({
            "header": {
                "user_id": 1, "account_type": 1, "short_limit": "4", "long_limit": "100",
                "long_remaining": 99, "short_remaining": 3, "status": 0,
                "results_requested": 5, "search_depth": "128", "minimum_similarity": 30,
                "query_image_display": "/userdata/x.png", "results_returned": 1
            },
            "results": [{
                "header": {"similarity": "87.5", "thumbnail": "https://img3.saucenao.com/t.jpg",
                           "index_id": 5, "index_name": "Index #5: Pixiv Images", "hidden": 0},
                "data": {"ext_urls": ["https://www.pixiv.net/artworks/1"], "title": "Sunset",
                         "pixiv_id": 1, "member_name": "artist", "member_id": 2}
            }]
        })
    }

    #[tokio::test]
    async fn test_saucenao_end_to_end_through_engine() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/search.php"))
            .and(query_param("api_key", "secret"))
            .and(query_param("output_type", "2"))
            .and(query_param("url", "https://example.com/a.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload()))
            .mount(&mock_server)
            .await;

        let mut defaults = SearchParameters::new();
        defaults.insert("api_key".into(), json!("secret"));
        let config = SearchConfig::default().with_engine_params("saucenao", defaults);
        let engine =
            ReverseSearchEngine::new(config).with_base_url(EngineKind::SauceNao, mock_server.uri());

        let input = ImageInput::from_url("https://example.com/a.jpg");
        let response = engine
            .search("saucenao", input, &SearchParameters::new())
            .await
            .expect("search should succeed");

        let items = response.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].similarity, Some(87.5));
        assert!(response.show_result().contains("87.5%"));
        assert!(response.url().ends_with("/userdata/x.png"));
    }

    #[tokio::test]
    async fn test_saucenao_missing_api_key_renders_error_block() {
        let engine = ReverseSearchEngine::new(SearchConfig::default());
        let input = ImageInput::from_url("https://example.com/a.jpg");
        let text = engine
            .search_text("saucenao", input, &SearchParameters::new())
            .await;
        assert!(text.starts_with(&"=".repeat(50)));
        assert!(text.contains("SAUCENAO 搜尋失敗"));
    }

    #[tokio::test]
    async fn test_saucenao_malformed_json() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/search.php"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>rate limited</html>"))
            .mount(&mock_server)
            .await;

        let mut params = SearchParameters::new();
        params.insert("api_key".into(), json!("secret"));
        let engine = ReverseSearchEngine::new(SearchConfig::default())
            .with_base_url(EngineKind::SauceNao, mock_server.uri());
        let err = engine
            .search("saucenao", ImageInput::from_file(jpeg_bytes()), &params)
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }

    #[tokio::test]
    async fn test_saucenao_uploads_file_part() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/search.php"))
            .and(query_param("api_key", "secret"))
            .and(header_regex("content-type", "^multipart/form-data"))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let params = SauceNaoParams {
            api_key: Some("secret".into()),
            ..SauceNaoParams::default()
        };
        let service = SauceNaoService::new(fetcher(), params)
            .unwrap()
            .with_base_url(mock_server.uri());
        let response = service.search(&ImageInput::from_file(jpeg_bytes())).await.unwrap();
        assert_eq!(response.raw.len(), 1);

        let requests = mock_server.received_requests().await.unwrap();
        assert!(body_contains(&requests[0].body, "name=\"file\""));
        assert!(body_contains(&requests[0].body, "JFIF"));
        assert!(!requests[0].url.query_pairs().any(|(k, _)| k == "url"));
    }
}

mod baidu_tests {
    use super::*;
    use img_rev_searcher::reverse_search::services::BaiDuService;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_baidu_noresult_card_is_empty() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": 0,
                "data": {"url": format!("{}/s?card_key=abc", mock_server.uri())}
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/s"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                concat!(
                    "<html><body><script>",
                    r#"window.cardData = [{"cardName":"noresult","tplData":{}}];"#,
                    "</script></body></html>",
                ),
            ))
            .mount(&mock_server)
            .await;

        let service = BaiDuService::new(fetcher()).with_base_url(mock_server.uri());
        let response = service.search(&ImageInput::from_file(jpeg_bytes())).await.unwrap();

        assert!(response.raw.is_empty());
        assert!(response.exact_matches.is_empty());
        assert!(response.url.ends_with("/s?card_key=abc"));
    }

    #[tokio::test]
    async fn test_baidu_simipic_merges_same() {
        let mock_server = MockServer::start().await;
        let uri = mock_server.uri();

        Mock::given(method("GET"))
            .and(path("/img.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(jpeg_bytes()))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"url": format!("{}/s", uri)}
            })))
            .mount(&mock_server)
            .await;

        let cards = json!([
            {
                "cardName": "same",
                "tplData": {"list": [{"url": "https://same/1", "image_src": "https://s/1"}]}
            },
            {"cardName": "simipic", "tplData": {"firstUrl": format!("{}/ajax/similar", uri)}}
        ]);
        Mock::given(method("GET"))
            .and(path("/s"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                "<html><script>window.cardData = {};</script></html>",
                cards
            )))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/ajax/similar"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"list": [{"thumbUrl": "https://t/1", "fromUrl": "https://from/1"}]}
            })))
            .mount(&mock_server)
            .await;

        let service = BaiDuService::new(fetcher()).with_base_url(&uri);
        let response = service
            .search(&ImageInput::from_url(format!("{}/img.jpg", uri)))
            .await
            .unwrap();

        assert_eq!(response.exact_matches.len(), 1);
        assert_eq!(response.raw[0].url, "https://from/1");
    }
}

mod bing_tests {
    use super::*;
    use img_rev_searcher::reverse_search::services::BingService;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_bing_upload_without_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/images/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>captcha</html>"))
            .mount(&mock_server)
            .await;

        let service = BingService::new(fetcher()).with_base_url(mock_server.uri());
        let err = service.search(&ImageInput::from_file(jpeg_bytes())).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::TokenNotFound);
    }

    #[tokio::test]
    async fn test_bing_upload_then_knowledge() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/images/search"))
            .and(query_param("iss", "sbiupload"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"<div data-token="bcid_Abc.123-x"></div>"#),
            )
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/images/api/custom/knowledge"))
            .and(query_param("insightsToken", "bcid_Abc.123-x"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tags": [{"actions": [
                    {"actionType": "BestRepresentativeQuery", "displayName": "Mount Fuji"},
                    {
                        "actionType": "VisualSearch",
                        "data": {"value": [{"name": "Fuji", "hostPageUrl": "https://f"}]}
                    }
                ]}]
            })))
            .mount(&mock_server)
            .await;

        let service = BingService::new(fetcher()).with_base_url(mock_server.uri());
        let response = service.search(&ImageInput::from_file(jpeg_bytes())).await.unwrap();
        assert_eq!(response.best_guess.as_deref(), Some("Mount Fuji"));
        assert_eq!(response.visual_search.len(), 1);
    }

    #[tokio::test]
    async fn test_bing_url_search_skips_upload() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/images/api/custom/knowledge"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tags": []})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let service = BingService::new(fetcher()).with_base_url(mock_server.uri());
        let response = service
            .search(&ImageInput::from_url("https://example.com/a.jpg"))
            .await
            .unwrap();
        assert!(response.url.contains("sbisrc=UrlPaste"));
        assert!(response.url.contains("imgurl:https%3A%2F%2Fexample.com%2Fa.jpg"));
    }
}

mod copyseeker_tests {
    use super::*;
    use img_rev_searcher::EngineResponse;
    use img_rev_searcher::reverse_search::services::CopyseekerService;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SET_COOKIE: &str = "0015445749632853586010cae7d4f7587b0a2eac4e";
    const URL_SEARCH: &str = "401c0a10f9d5aa3972a00e210283699640fbc08a21";
    const GET_RESULTS: &str = "40d33eda9b5e7a28d089feea4356d5925a1931b2f7";

    async fn mount_cookie(mock_server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("next-action", SET_COOKIE))
            .respond_with(ResponseTemplate::new(200).set_body_string("0:[]"))
            .mount(mock_server)
            .await;
    }

    #[tokio::test]
    async fn test_copyseeker_without_discovery_id_is_empty() {
        let mock_server = MockServer::start().await;
        mount_cookie(&mock_server).await;

        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("next-action", URL_SEARCH))
            .respond_with(ResponseTemplate::new(200).set_body_string("0:[\"$@1\"]\n"))
            .mount(&mock_server)
            .await;

        let service = CopyseekerService::new(fetcher()).with_base_url(mock_server.uri());
        let response = service
            .search(&ImageInput::from_url("https://example.com/a.jpg"))
            .await
            .unwrap();
        assert!(response.is_empty());
        assert_eq!(response.show_result(), "匹配圖源：無\n相似圖片：");
    }

    #[tokio::test]
    async fn test_copyseeker_three_phases() {
        let mock_server = MockServer::start().await;
        mount_cookie(&mock_server).await;

        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("next-action", URL_SEARCH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("0:[\"$@1\"]\n1:{\"discoveryId\":\"disc-1\"}\n"),
            )
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/discovery"))
            .and(header("next-action", GET_RESULTS))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                concat!(
                    "0:[\"$@1\"]\n",
                    r#"1:{"id":"disc-1","imageUrl":"https://example.com/a.jpg","#,
                    r#""totalLinksFound":1,"#,
                    r#""pages":[{"url":"https://found/1","title":"Found"}],"#,
                    r#""visuallySimilarImages":["https://sim/1"]}"#,
                    "\n",
                ),
            ))
            .mount(&mock_server)
            .await;

        let service = CopyseekerService::new(fetcher()).with_base_url(mock_server.uri());
        let response = service
            .search(&ImageInput::from_url("https://example.com/a.jpg"))
            .await
            .unwrap();
        assert_eq!(response.id, "disc-1");
        assert_eq!(response.raw[0].url, "https://found/1");
        assert_eq!(response.similar_image_urls, vec!["https://sim/1".to_string()]);
    }

    #[tokio::test]
    async fn test_copyseeker_missing_results_frame() {
        let mock_server = MockServer::start().await;
        mount_cookie(&mock_server).await;

        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("next-action", URL_SEARCH))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"1:{"discoveryId":"disc-2"}"#),
            )
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/discovery"))
            .respond_with(ResponseTemplate::new(200).set_body_string("0:null"))
            .mount(&mock_server)
            .await;

        let service = CopyseekerService::new(fetcher()).with_base_url(mock_server.uri());
        let err = service
            .search(&ImageInput::from_url("https://example.com/a.jpg"))
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::DiscoveryFailed);
    }
}

mod ehentai_tests {
    use super::*;
    use img_rev_searcher::reverse_search::services::EHentaiService;
    use img_rev_searcher::reverse_search::services::ehentai::EHentaiParams;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_ehentai_downloads_url_then_parses() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/cover.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(jpeg_bytes()))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/image_lookup.php"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                concat!(
                    r#"<html><body><table class="itg"><tr>"#,
                    r#"<td class="gl1c"><div class="cn">Manga</div></td>"#,
                    r#"<td><a href="https://e-hentai.org/g/1/a/">"#,
                    r#"<div class="glink">Found Gallery</div></a></td>"#,
                    "</tr></table></body></html>",
                ),
            ))
            .mount(&mock_server)
            .await;

        let service = EHentaiService::new(fetcher(), EHentaiParams::default())
            .with_base_url(mock_server.uri());
        let response = service
            .search(&ImageInput::from_url(format!("{}/cover.jpg", mock_server.uri())))
            .await
            .unwrap();
        assert_eq!(response.raw.len(), 1);
        assert_eq!(response.raw[0].title, "Found Gallery");
        assert_eq!(response.raw[0].kind, "Manga");
    }
}

mod google_lens_tests {
    use super::*;
    use img_rev_searcher::reverse_search::services::GoogleLensService;
    use img_rev_searcher::reverse_search::services::google::GoogleLensParams;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_google_follows_exact_matches_link() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/uploadbyurl"))
            .and(query_param("hl", "en-HK"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><a href="/search?udm=48&vsrid=abc">Exact matches</a></html>"#,
            ))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("udm", "48"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                concat!(
                    r#"<html><div class="YxbOwd"><a class="ngTNl" href="https://www.site.com/p">"#,
                    r#"<div class="ZhosBf">Exact</div></a></div></html>"#,
                ),
            ))
            .mount(&mock_server)
            .await;

        let service = GoogleLensService::new(fetcher(), GoogleLensParams::default())
            .unwrap()
            .with_base_url(mock_server.uri())
            .with_search_url(mock_server.uri());
        let response = service
            .search(&ImageInput::from_url("https://example.com/a.jpg"))
            .await
            .unwrap();
        assert_eq!(response.raw.len(), 1);
        assert_eq!(response.raw[0].title, "Exact");
        assert_eq!(response.raw[0].site_name, "site.com");
        assert!(response.url.contains("udm=48"));
    }

    #[tokio::test]
    async fn test_google_sub_search_failure_falls_back() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/uploadbyurl"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                concat!(
                    r#"<html><a href="/search?udm=48">Exact</a>"#,
                    r#"<div class="YxbOwd"><div class="ZhosBf">First page</div></div></html>"#,
                ),
            ))
            .mount(&mock_server)
            .await;

        let service = GoogleLensService::new(fetcher(), GoogleLensParams::default())
            .unwrap()
            .with_base_url(mock_server.uri())
            .with_search_url("http://127.0.0.1:9");
        let response = service
            .search(&ImageInput::from_url("https://example.com/a.jpg"))
            .await
            .unwrap();
        assert_eq!(response.raw[0].title, "First page");
    }
}

mod tineye_tests {
    use super::*;
    use img_rev_searcher::reverse_search::services::TinEyeService;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn page(total_pages: u32, image: &str) -> serde_json::Value {
        json!({
            "query": {"key": "qkey", "hash": "qhash"},
            "query_hash": "qhash",
            "total_pages": total_pages,
            "matches": [{
                "image_url": image, "domain": "example.com", "width": 10, "height": 20,
                "backlinks": [{
                    "url": "https://example.com/full.jpg",
                    "backlink": "https://example.com/",
                    "crawl_date": "2020-01-01"
                }]
            }]
        })
    }

    async fn mount_search(mock_server: &MockServer, total_pages: u32) {
        Mock::given(method("POST"))
            .and(path("/api/v1/result_json/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(page(total_pages, "https://t/1")),
            )
            .mount(mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/v1/search/get_domains/qhash"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "domains": [["example.com", 4, ["stock"]], ["other.org", 1, []]]
            })))
            .mount(mock_server)
            .await;
    }

    #[tokio::test]
    async fn test_tineye_search_with_domains() {
        let mock_server = MockServer::start().await;
        mount_search(&mock_server, 2).await;

        let service =
            TinEyeService::new(fetcher(), Default::default()).with_base_url(mock_server.uri());
        let response = service
            .search(&ImageInput::from_url("https://example.com/a.jpg"))
            .await
            .unwrap();

        assert_eq!(response.page_number, 1);
        assert_eq!(response.domains.len(), 2);
        assert_eq!(response.domains[0].count, 4);
        assert!(response.url.starts_with(&format!("{}/search/qkey?", mock_server.uri())));
        assert!(response.url.contains("page=1"));
    }

    #[tokio::test]
    async fn test_tineye_paging_boundaries() {
        let mock_server = MockServer::start().await;
        mount_search(&mock_server, 2).await;

        Mock::given(method("GET"))
            .and(path("/api/v1/result_json/qkey"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(2, "https://t/2")))
            .mount(&mock_server)
            .await;

        let service =
            TinEyeService::new(fetcher(), Default::default()).with_base_url(mock_server.uri());
        let first = service.search(&ImageInput::from_file(jpeg_bytes())).await.unwrap();

        assert!(service.pre_page(&first).await.is_none());

        let second = service.next_page(&first).await.expect("second page");
        assert_eq!(second.page_number, 2);
        assert_eq!(second.raw[0].thumbnail, "https://t/2");
        assert_eq!(second.domains.len(), 2);

        assert!(service.next_page(&second).await.is_none());
    }

    #[tokio::test]
    async fn test_tineye_domain_lookup_is_optional() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/result_json/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(1, "https://t/1")))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/v1/search/get_domains/qhash"))
            .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
            .mount(&mock_server)
            .await;

        let service =
            TinEyeService::new(fetcher(), Default::default()).with_base_url(mock_server.uri());
        let response = service
            .search(&ImageInput::from_url("https://example.com/a.jpg"))
            .await
            .unwrap();
        assert!(response.domains.is_empty());
        assert_eq!(response.raw.len(), 1);
    }
}

mod animetrace_tests {
    use super::*;
    use img_rev_searcher::EngineResponse;
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use img_rev_searcher::reverse_search::services::AnimeTraceService;
    use img_rev_searcher::reverse_search::services::animetrace::AnimeTraceParams;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header_regex, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn payload() -> serde_json::Value {
        json!({
            "code": 0, "ai": true, "trace_id": "t2",
            "data": [{"box": [0, 0, 1, 1], "character": [{"character": "Rin", "work": "Fate"}]}]
        })
    }

    #[tokio::test]
    async fn test_animetrace_url_json_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/search"))
            .and(body_partial_json(json!({"url": "https://example.com/a.jpg"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 0, "ai": false, "trace_id": "t1",
                "data": [{
                    "box": [0, 0, 1, 1],
                    "box_id": "b",
                    "character": [{"character": "Saber", "work": "Fate"}]
                }]
            })))
            .mount(&mock_server)
            .await;

        let service =
            AnimeTraceService::new(fetcher(), Default::default()).with_base_url(mock_server.uri());
        let response = service
            .search(&ImageInput::from_url("https://example.com/a.jpg"))
            .await
            .unwrap();
        assert_eq!(response.raw[0].characters[0].name, "Saber");
        assert!(response.show_result().contains("作品名: Fate"));
    }

    #[tokio::test]
    async fn test_animetrace_base64_json_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/search"))
            .and(header_regex("content-type", "^application/json"))
            .and(body_partial_json(json!({
                "base64": STANDARD.encode(jpeg_bytes()),
                "is_multi": 1
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let params = AnimeTraceParams {
            is_multi: Some(1),
            base64: true,
            ..AnimeTraceParams::default()
        };
        let service = AnimeTraceService::new(fetcher(), params).with_base_url(mock_server.uri());
        let response = service.search(&ImageInput::from_file(jpeg_bytes())).await.unwrap();
        assert!(response.ai);
        assert_eq!(response.raw[0].characters[0].name, "Rin");
    }

    #[tokio::test]
    async fn test_animetrace_multipart_file_upload() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/search"))
            .and(header_regex("content-type", "^multipart/form-data"))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let params = AnimeTraceParams {
            model: Some("anime_model_lovelive".into()),
            ..AnimeTraceParams::default()
        };
        let service = AnimeTraceService::new(fetcher(), params).with_base_url(mock_server.uri());
        let response = service.search(&ImageInput::from_file(jpeg_bytes())).await.unwrap();
        assert_eq!(response.trace_id.as_deref(), Some("t2"));

        let requests = mock_server.received_requests().await.unwrap();
        let body = &requests[0].body;
        assert!(body_contains(body, "name=\"file\""));
        assert!(body_contains(body, "name=\"model\""));
        assert!(body_contains(body, "anime_model_lovelive"));
        assert!(!body_contains(body, "name=\"base64\""));
    }
}

mod cookie_tests {
    use super::*;
    use img_rev_searcher::reverse_search::services::TinEyeService;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher_with_cookie() -> HttpFetcher {
        let options = TransportOptions {
            cookies: Some("sess=1".into()),
            ..TransportOptions::default()
        };
        HttpFetcher::new(&options).expect("fetcher")
    }

    #[tokio::test]
    async fn test_configured_cookie_reaches_other_paths() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/result_json/"))
            .and(header("cookie", "sess=1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": {"key": "qkey", "hash": "qhash"},
                "total_pages": 1,
                "matches": []
            })))
            .mount(&mock_server)
            .await;

        // 只有帶 cookie 才回傳網域統計
        Mock::given(method("GET"))
            .and(path("/api/v1/search/get_domains/qhash"))
            .and(header("cookie", "sess=1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "domains": [["example.com", 2, []], ["other.org", 1, []]]
            })))
            .mount(&mock_server)
            .await;

        let service = TinEyeService::new(fetcher_with_cookie(), Default::default())
            .with_base_url(mock_server.uri());
        let response = service
            .search(&ImageInput::from_url("https://example.com/a.jpg"))
            .await
            .unwrap();
        assert_eq!(response.domains.len(), 2);
    }

    #[tokio::test]
    async fn test_cookie_reseeded_after_clear() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(header("cookie", "sess=1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&mock_server)
            .await;

        let fetcher = fetcher_with_cookie();
        let first = format!("{}/a/first", mock_server.uri());
        let second = format!("{}/b", mock_server.uri());

        let resp = fetcher.get("cookie first", &first, &[], &[]).await.unwrap();
        assert_eq!(resp.status, 200);

        fetcher.clear_cookies();
        let resp = fetcher.get("cookie second", &second, &[], &[]).await.unwrap();
        assert_eq!(resp.status, 200);
    }

    #[tokio::test]
    async fn test_download_does_not_send_configured_cookie() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/img.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(jpeg_bytes()))
            .mount(&mock_server)
            .await;

        let fetcher = fetcher_with_cookie();
        let url = format!("{}/img.jpg", mock_server.uri());
        let bytes = fetcher.download("download image", &url).await.unwrap();
        assert_eq!(bytes, jpeg_bytes());

        let requests = mock_server.received_requests().await.unwrap();
        assert!(requests[0].headers.get("cookie").is_none());
    }
}
