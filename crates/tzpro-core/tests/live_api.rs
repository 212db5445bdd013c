use std::env;
use std::sync::Once;

use tzpro_core::api::block::Block;
use tzpro_core::api::explorer::Supply;
use tzpro_core::{Client, ClientConfig, CursorState, Query, RowList};

static TRACING_INIT: Once = Once::new();

fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tzpro_core=debug")),
            )
            .with_target(true)
            .try_init();
    });
}

fn live_client() -> Client {
    let url = env::var("TZPRO_TEST_URL").expect("TZPRO_TEST_URL must be set");
    let mut config = ClientConfig::new(url);
    if let Ok(key) = env::var("TZPRO_TEST_API_KEY") {
        config = config.with_api_key(key);
    }
    Client::new(&config).expect("client must construct")
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a reachable TzPro API; set TZPRO_TEST_URL (and TZPRO_TEST_API_KEY)"]
async fn live_tip_status_and_head_agree() {
    init_tracing();
    let client = live_client();

    let tip = client.explorer().tip().await.expect("tip must decode");
    eprintln!("[itest] {} tip at height {}", tip.network, tip.height);
    assert!(tip.height > 0);
    assert!(!tip.hash.is_zero());

    let status = client
        .explorer()
        .status_with_columns(&["status", "blocks", "indexed"])
        .await
        .expect("positional status must decode");
    assert!(status.blocks >= status.indexed);

    let head = client
        .blocks()
        .head(&Query::new())
        .await
        .expect("head block must decode");
    assert!(head.height >= tip.height);
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a reachable TzPro API; set TZPRO_TEST_URL (and TZPRO_TEST_API_KEY)"]
async fn live_table_pages_follow_cursor() {
    init_tracing();
    let client = live_client();

    let mut query = client
        .new_table_query::<Supply>()
        .with_columns(["row_id", "height", "total"])
        .with_limit(3);
    let first = query
        .next_page()
        .await
        .expect("first page must load")
        .expect("supply table must not be empty");
    assert_eq!(first.len(), 3);
    assert_eq!(query.cursor(), Some(first.cursor()));
    assert_eq!(query.state(), CursorState::HasPage);

    let second = query
        .next_page()
        .await
        .expect("second page must load")
        .expect("supply table must have more rows");
    assert!(second[0].row_id > first.cursor());

    let latest = client
        .new_table_query::<Block>()
        .with_columns(["row_id", "height", "time"])
        .with_limit(1)
        .with_desc()
        .run()
        .await
        .expect("latest block row must decode");
    assert_eq!(latest.len(), 1);
}
