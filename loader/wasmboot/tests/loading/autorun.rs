use pretty_assertions::assert_eq;
use url::Url;
use wasmboot::{autorun, StartRoutine};

use crate::common::{bootstrapper, global_i32, serving, COUNTER};

#[tokio::test]
async fn fragment_requests_exactly_one_resource() {
    let fetcher = serving("mymodule", COUNTER);
    let boot = bootstrapper(&fetcher);
    let url = Url::parse("https://example.com/js/loader.js#mymodule").unwrap();

    let mut loaded = autorun(&url, &boot).await.unwrap().expect("module loaded");

    assert_eq!(fetcher.requests(), vec!["/wasm/mymodule.wasm"]);
    assert_eq!(loaded.identifier(), "mymodule");
    assert_eq!(loaded.start_routine(), StartRoutine::Export);
    assert_eq!(global_i32(&mut loaded, "runs"), 1);
}

#[tokio::test]
async fn empty_fragment_fetches_nothing() {
    let fetcher = serving("mymodule", COUNTER);
    let boot = bootstrapper(&fetcher);

    for s in [
        "https://example.com/js/loader.js",
        "https://example.com/js/loader.js#",
        "https://example.com/js/loader.js?secure",
    ] {
        let url = Url::parse(s).unwrap();
        assert!(autorun(&url, &boot).await.unwrap().is_none(), "{s}");
    }
    assert!(fetcher.requests().is_empty());

    // The loader is still usable by an explicit invoker.
    let loaded = boot
        .load("mymodule", wasmboot::Environment::permissive())
        .await
        .unwrap();
    assert_eq!(loaded.identifier(), "mymodule");
    assert_eq!(fetcher.requests(), vec!["/wasm/mymodule.wasm"]);
}

#[tokio::test]
async fn identifier_is_not_escaped() {
    let fetcher = serving("games/pong", COUNTER);
    let boot = bootstrapper(&fetcher);
    let url = Url::parse("https://example.com/loader.js#games/pong").unwrap();

    autorun(&url, &boot).await.unwrap().expect("module loaded");
    assert_eq!(fetcher.requests(), vec!["/wasm/games/pong.wasm"]);
}
