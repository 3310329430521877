//! Integration tests for the sweep orchestrator
//!
//! These tests drive the orchestrator against a scripted in-memory catalog
//! and use wiremock to serve the images it downloads.

use async_trait::async_trait;
use catalog_sweep::assets::AssetFetcher;
use catalog_sweep::config::OutputConfig;
use catalog_sweep::driver::{CardSummary, DriverResult, PageDriver};
use catalog_sweep::store::{JsonFileStore, Record, Stores};
use catalog_sweep::sweep::{Orchestrator, RunMode, SweepOptions, SweepPhase};
use catalog_sweep::SweepError;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// One card of the scripted catalog
#[derive(Debug, Clone)]
struct FakeCard {
    summary: CardSummary,
    clickable: bool,
    detail_appears: bool,
    secondary: Vec<String>,
}

impl FakeCard {
    fn new(name: &str, image_url: String) -> Self {
        Self {
            summary: CardSummary {
                name: name.to_string(),
                category: "Herramientas".to_string(),
                price: "$ 100".to_string(),
                description: format!("{} description", name),
                image_url,
            },
            clickable: true,
            detail_appears: true,
            secondary: Vec::new(),
        }
    }
}

/// Scripted list/detail catalog
///
/// Cards are only visible from the list view, so a missed recovery shows up
/// as an out-of-range failure on the next index.
struct FakeCatalog {
    cards: Vec<FakeCard>,
    in_detail: Option<usize>,
    back_available: bool,
    list_reappears: bool,
    events: Vec<String>,
}

impl FakeCatalog {
    fn new(cards: Vec<FakeCard>) -> Self {
        Self {
            cards,
            in_detail: None,
            back_available: true,
            list_reappears: true,
            events: Vec::new(),
        }
    }

    fn count(&self, event: &str) -> usize {
        self.events.iter().filter(|e| e.as_str() == event).count()
    }

    fn opened(&self) -> Vec<usize> {
        self.events
            .iter()
            .filter_map(|e| e.strip_prefix("open "))
            .map(|i| i.parse().unwrap())
            .collect()
    }
}

#[async_trait]
impl PageDriver for FakeCatalog {
    async fn load_catalog_root(&mut self) -> DriverResult<()> {
        self.events.push("load".to_string());
        self.in_detail = None;
        Ok(())
    }

    async fn scroll_to_fully_loaded(&mut self) -> DriverResult<()> {
        self.events.push("scroll".to_string());
        Ok(())
    }

    async fn count_cards(&mut self) -> DriverResult<usize> {
        Ok(if self.in_detail.is_some() {
            0
        } else {
            self.cards.len()
        })
    }

    async fn read_card_summary(&mut self, index: usize) -> DriverResult<Option<CardSummary>> {
        if self.in_detail.is_some() {
            return Ok(None);
        }
        Ok(self.cards.get(index).map(|card| card.summary.clone()))
    }

    async fn open_detail(&mut self, index: usize) -> DriverResult<bool> {
        self.events.push(format!("open {}", index));
        match self.cards.get(index) {
            Some(card) if card.clickable => {
                self.in_detail = Some(index);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn wait_for_detail_marker(&mut self, _timeout: Duration) -> DriverResult<bool> {
        Ok(self
            .in_detail
            .map(|i| self.cards[i].detail_appears)
            .unwrap_or(false))
    }

    async fn read_secondary_image_urls(&mut self) -> DriverResult<Vec<String>> {
        Ok(self
            .in_detail
            .map(|i| self.cards[i].secondary.clone())
            .unwrap_or_default())
    }

    async fn navigate_back(&mut self) -> DriverResult<bool> {
        self.events.push("back".to_string());
        if self.back_available && self.in_detail.is_some() {
            self.in_detail = None;
            return Ok(true);
        }
        Ok(false)
    }

    async fn wait_for_list(&mut self, _timeout: Duration) -> DriverResult<bool> {
        Ok(self.list_reappears && self.in_detail.is_none())
    }

    async fn close(&mut self) -> DriverResult<()> {
        self.events.push("close".to_string());
        Ok(())
    }
}

/// Starts an image server answering every `/img/...` path
async fn image_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex("^/img/.*$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xff, 0xd8, 0xff, 0xe0]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    server
}

fn output_in(dir: &TempDir) -> OutputConfig {
    OutputConfig {
        checkpoint_path: dir.path().join("estado.json"),
        failures_path: dir.path().join("errores.json"),
        records_path: dir.path().join("productos.json"),
        images_dir: dir.path().join("images"),
    }
}

fn cards(server: &MockServer, names: &[&str]) -> Vec<FakeCard> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| FakeCard::new(name, format!("{}/img/{}.jpg", server.uri(), i)))
        .collect()
}

fn orchestrator(
    dir: &TempDir,
    catalog: FakeCatalog,
    prune_on_success: bool,
) -> Orchestrator<FakeCatalog> {
    let output = output_in(dir);
    let fetcher = AssetFetcher::new(&output.images_dir, Duration::from_secs(5))
        .expect("Failed to build fetcher");
    let options = SweepOptions {
        detail_timeout: Duration::from_millis(50),
        list_timeout: Duration::from_millis(50),
        prune_on_success,
    };
    Orchestrator::new(catalog, fetcher, Stores::from_config(&output), options)
        .expect("Failed to load sweep state")
}

fn record_names(records: &[Record]) -> Vec<&str> {
    records.iter().map(|r| r.name.as_str()).collect()
}

/// `total` on disk always equals the number of products
fn assert_records_consistent(stores: &Stores) {
    let document = stores.records.load_document();
    assert_eq!(document.total, document.products.len());
}

#[tokio::test]
async fn test_middle_card_timeout_is_recorded_and_skipped() {
    let server = image_server().await;
    let dir = TempDir::new().unwrap();

    let mut catalog_cards = cards(&server, &["Alicate", "Broca", "Cincel"]);
    catalog_cards[1].detail_appears = false;

    let mut sweep = orchestrator(&dir, FakeCatalog::new(catalog_cards), false);
    let summary = sweep.run(RunMode::Normal).await.expect("Sweep failed");

    assert_eq!(summary.mode, RunMode::Normal);
    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.records, 2);
    assert_eq!(summary.failed_indices, vec![1]);
    assert_eq!(sweep.phase(), SweepPhase::Done);

    let stores = Stores::from_config(&output_in(&dir));
    assert_eq!(record_names(&stores.records.read()), vec!["Alicate", "Cincel"]);
    assert_eq!(stores.failures.read(), vec![1]);
    // Index 1 wrote 1, index 2 then succeeded and wrote 3
    assert_eq!(stores.checkpoint.read(), 3);
    assert_records_consistent(&stores);

    let records = stores.records.read();
    assert_eq!(records[0].image, "./images/alicate.jpg");
    assert_eq!(records[0].category, "Herramientas");
    assert!(dir.path().join("images/alicate.jpg").exists());
    assert!(dir.path().join("images/cincel.jpg").exists());
    assert!(!dir.path().join("images/broca.jpg").exists());

    assert_eq!(sweep.driver().count("close"), 1);
}

#[tokio::test]
async fn test_checkpoint_stays_on_failed_last_index() {
    let server = image_server().await;
    let dir = TempDir::new().unwrap();

    let mut catalog_cards = cards(&server, &["Alicate", "Broca", "Cincel"]);
    catalog_cards[2].clickable = false;

    let mut sweep = orchestrator(&dir, FakeCatalog::new(catalog_cards.clone()), false);
    sweep.run(RunMode::Normal).await.unwrap();

    let stores = Stores::from_config(&output_in(&dir));
    assert_eq!(stores.checkpoint.read(), 2);
    assert_eq!(stores.failures.read(), vec![2]);

    // The next normal run re-attempts index 2 only; a second failure is not duplicated
    let mut again = orchestrator(&dir, FakeCatalog::new(catalog_cards), false);
    let summary = again.run(RunMode::Normal).await.unwrap();

    assert_eq!(again.driver().opened(), vec![2]);
    assert_eq!(summary.attempted, 1);
    assert_eq!(stores.failures.read(), vec![2]);
    assert_eq!(stores.checkpoint.read(), 2);
    assert_eq!(stores.records.read().len(), 2);
}

#[tokio::test]
async fn test_second_run_does_not_duplicate_records() {
    let server = image_server().await;
    let dir = TempDir::new().unwrap();
    let catalog_cards = cards(&server, &["Alicate", "Broca", "Cincel"]);

    let mut first = orchestrator(&dir, FakeCatalog::new(catalog_cards.clone()), false);
    first.run(RunMode::Normal).await.unwrap();
    let records_path = dir.path().join("productos.json");
    let after_first = std::fs::read_to_string(&records_path).unwrap();

    let mut second = orchestrator(&dir, FakeCatalog::new(catalog_cards), false);
    let summary = second.run(RunMode::Normal).await.unwrap();
    let after_second = std::fs::read_to_string(&records_path).unwrap();

    assert_eq!(summary.attempted, 0);
    assert_eq!(summary.records, 3);
    assert!(second.driver().opened().is_empty());
    assert_eq!(after_first, after_second);
}

#[tokio::test]
async fn test_resume_skips_indices_below_checkpoint() {
    let server = image_server().await;
    let dir = TempDir::new().unwrap();
    let stores = Stores::from_config(&output_in(&dir));
    stores.checkpoint.write(2).unwrap();

    let catalog = FakeCatalog::new(cards(&server, &["A", "B", "C", "D"]));
    let mut sweep = orchestrator(&dir, catalog, false);
    assert_eq!(sweep.start_index(), 2);

    let summary = sweep.run(RunMode::Normal).await.unwrap();

    assert_eq!(sweep.driver().opened(), vec![2, 3]);
    assert_eq!(summary.attempted, 2);
    assert_eq!(record_names(&stores.records.read()), vec!["C", "D"]);
    assert_eq!(stores.checkpoint.read(), 4);
}

#[tokio::test]
async fn test_retry_keeps_checkpoint_and_failure_list() {
    let server = image_server().await;
    let dir = TempDir::new().unwrap();
    let stores = Stores::from_config(&output_in(&dir));

    let existing = vec![
        Record {
            name: "Alicate".to_string(),
            ..Record::default()
        },
        Record {
            name: "Cincel".to_string(),
            ..Record::default()
        },
    ];
    stores.checkpoint.write(3).unwrap();
    stores.failures.write(&[1]).unwrap();
    stores.records.write_all(&existing).unwrap();

    let catalog = FakeCatalog::new(cards(&server, &["Alicate", "Broca", "Cincel"]));
    let mut sweep = orchestrator(&dir, catalog, false);
    assert_eq!(sweep.failed_indices(), &[1]);

    let summary = sweep.run(RunMode::RetryOnly).await.unwrap();

    assert_eq!(summary.mode, RunMode::RetryOnly);
    assert_eq!(summary.attempted, 1);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(sweep.driver().opened(), vec![1]);

    assert_eq!(
        record_names(&stores.records.read()),
        vec!["Alicate", "Cincel", "Broca"]
    );
    assert_eq!(stores.failures.read(), vec![1]);
    assert_eq!(stores.checkpoint.read(), 3);
    assert_records_consistent(&stores);
}

#[tokio::test]
async fn test_retry_with_pruning_clears_recovered_index() {
    let server = image_server().await;
    let dir = TempDir::new().unwrap();
    let stores = Stores::from_config(&output_in(&dir));
    stores.checkpoint.write(3).unwrap();
    stores.failures.write(&[2, 0]).unwrap();

    let mut catalog_cards = cards(&server, &["Alicate", "Broca", "Cincel"]);
    catalog_cards[0].detail_appears = false;

    let mut sweep = orchestrator(&dir, FakeCatalog::new(catalog_cards), true);
    let summary = sweep.run(RunMode::RetryOnly).await.unwrap();

    // Discovery order, not ascending
    assert_eq!(sweep.driver().opened(), vec![2, 0]);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed_indices, vec![0]);
    assert_eq!(stores.failures.read(), vec![0]);
    assert_eq!(record_names(&stores.records.read()), vec!["Cincel"]);
    assert_eq!(stores.checkpoint.read(), 3);
}

#[tokio::test]
async fn test_retry_without_failures_runs_normal_scan() {
    let server = image_server().await;
    let dir = TempDir::new().unwrap();

    let catalog = FakeCatalog::new(cards(&server, &["A", "B"]));
    let mut sweep = orchestrator(&dir, catalog, false);
    let summary = sweep.run(RunMode::RetryOnly).await.unwrap();

    assert_eq!(summary.mode, RunMode::Normal);
    assert_eq!(summary.records, 2);
}

#[tokio::test]
async fn test_missing_back_button_reloads_catalog() {
    let server = image_server().await;
    let dir = TempDir::new().unwrap();

    let mut catalog = FakeCatalog::new(cards(&server, &["A", "B", "C"]));
    catalog.back_available = false;

    let mut sweep = orchestrator(&dir, catalog, false);
    let summary = sweep.run(RunMode::Normal).await.unwrap();

    // Every index succeeded, so each reload restored the list view
    assert_eq!(summary.succeeded, 3);
    assert_eq!(sweep.driver().count("load"), 1 + 3);
    assert_eq!(sweep.driver().count("scroll"), 1 + 3);
}

#[tokio::test]
async fn test_list_not_reappearing_reloads_catalog() {
    let server = image_server().await;
    let dir = TempDir::new().unwrap();

    let mut catalog = FakeCatalog::new(cards(&server, &["A", "B"]));
    catalog.list_reappears = false;

    let mut sweep = orchestrator(&dir, catalog, false);
    let summary = sweep.run(RunMode::Normal).await.unwrap();

    assert_eq!(summary.succeeded, 2);
    assert_eq!(sweep.driver().count("back"), 2);
    assert_eq!(sweep.driver().count("load"), 1 + 2);
}

#[tokio::test]
async fn test_working_back_button_avoids_reload() {
    let server = image_server().await;
    let dir = TempDir::new().unwrap();

    let catalog = FakeCatalog::new(cards(&server, &["A", "B", "C"]));
    let mut sweep = orchestrator(&dir, catalog, false);
    sweep.run(RunMode::Normal).await.unwrap();

    assert_eq!(sweep.driver().count("load"), 1);
    assert_eq!(sweep.driver().count("back"), 3);
}

#[tokio::test]
async fn test_secondary_images_filtered_and_numbered() {
    let server = image_server().await;
    let dir = TempDir::new().unwrap();

    let mut card = FakeCard::new(
        "Taladro (Inalámbrico) Núm. 1!",
        format!("{}/img/main.jpg", server.uri()),
    );
    card.secondary = vec![
        format!("{}/img/side-a.jpg", server.uri()),
        "/relative/side.jpg".to_string(),
        String::new(),
        format!("{}/img/side-b.jpg", server.uri()),
    ];

    let mut sweep = orchestrator(&dir, FakeCatalog::new(vec![card]), false);
    sweep.run(RunMode::Normal).await.unwrap();

    let record = &sweep.records()[0];
    assert_eq!(record.image, "./images/taladro_inalambrico_num_1_.jpg");
    assert_eq!(
        record.images,
        vec![
            "./images/taladro_inalambrico_num_1__1.jpg".to_string(),
            "./images/taladro_inalambrico_num_1__2.jpg".to_string(),
        ]
    );
    assert!(dir
        .path()
        .join("images/taladro_inalambrico_num_1__2.jpg")
        .exists());
}

#[tokio::test]
async fn test_card_without_image_or_fields() {
    let dir = TempDir::new().unwrap();

    let card = FakeCard {
        summary: CardSummary::default(),
        clickable: true,
        detail_appears: true,
        secondary: Vec::new(),
    };

    let mut sweep = orchestrator(&dir, FakeCatalog::new(vec![card]), false);
    let summary = sweep.run(RunMode::Normal).await.unwrap();

    assert_eq!(summary.succeeded, 1);
    let record = &sweep.records()[0];
    assert_eq!(record, &Record::default());
    assert!(!dir.path().join("images").exists());
}

#[tokio::test]
async fn test_failed_download_discards_whole_record() {
    let server = image_server().await;
    let dir = TempDir::new().unwrap();

    let mut catalog_cards = cards(&server, &["A", "B"]);
    catalog_cards[0].secondary = vec![
        format!("{}/img/ok.jpg", server.uri()),
        format!("{}/broken.jpg", server.uri()),
    ];

    let mut sweep = orchestrator(&dir, FakeCatalog::new(catalog_cards), false);
    let summary = sweep.run(RunMode::Normal).await.unwrap();

    assert_eq!(summary.failed_indices, vec![0]);
    assert_eq!(record_names(sweep.records()), vec!["B"]);

    let stores = Stores::from_config(&output_in(&dir));
    assert_eq!(record_names(&stores.records.read()), vec!["B"]);
    assert_eq!(stores.checkpoint.read(), 2);
}

#[tokio::test]
async fn test_store_failure_aborts_run_and_closes_session() {
    let server = image_server().await;
    let dir = TempDir::new().unwrap();

    // A regular file where the records directory should be
    let blocker = dir.path().join("blocked");
    std::fs::write(&blocker, b"not a directory").unwrap();
    let mut output = output_in(&dir);
    output.records_path = blocker.join("productos.json");

    let fetcher = AssetFetcher::new(&output.images_dir, Duration::from_secs(5)).unwrap();
    let mut sweep = Orchestrator::new(
        FakeCatalog::new(cards(&server, &["A", "B"])),
        fetcher,
        Stores::from_config(&output),
        SweepOptions::default(),
    )
    .unwrap();

    let result = sweep.run(RunMode::Normal).await;

    assert!(matches!(result, Err(SweepError::Store(_))));
    assert_eq!(sweep.driver().count("close"), 1);
    assert_eq!(sweep.driver().opened(), vec![0]);
    // The failed durable write happened before the checkpoint could advance
    assert_eq!(Stores::from_config(&output).checkpoint.read(), 0);
}

#[tokio::test]
async fn test_unparseable_records_are_backed_up_not_overwritten() {
    let server = image_server().await;
    let dir = TempDir::new().unwrap();
    let records_path = dir.path().join("productos.json");

    // A numeric price does not fit the record shape
    let earlier = r#"{
  "total": 2,
  "products": [
    {"name": "Alicate", "category": "", "price": "$ 10", "description": "", "image": "", "images": []},
    {"name": "Broca", "category": "", "price": 1500, "description": "", "image": "", "images": []}
  ]
}"#;
    std::fs::write(&records_path, earlier).unwrap();

    let mut sweep = orchestrator(&dir, FakeCatalog::new(cards(&server, &["Nuevo"])), false);
    assert!(sweep.records().is_empty());

    let summary = sweep.run(RunMode::Normal).await.unwrap();
    assert_eq!(summary.records, 1);

    let backup = dir.path().join("productos.json.corrupt");
    assert_eq!(std::fs::read_to_string(&backup).unwrap(), earlier);

    let stores = Stores::from_config(&output_in(&dir));
    assert_eq!(record_names(&stores.records.read()), vec!["Nuevo"]);
    assert_records_consistent(&stores);
}

#[tokio::test]
async fn test_run_twice_is_rejected() {
    let server = image_server().await;
    let dir = TempDir::new().unwrap();

    let mut sweep = orchestrator(&dir, FakeCatalog::new(cards(&server, &["A"])), false);
    sweep.run(RunMode::Normal).await.unwrap();

    let result = sweep.run(RunMode::Normal).await;
    assert!(matches!(
        result,
        Err(SweepError::InvalidTransition {
            from: SweepPhase::Done,
            to: SweepPhase::ModeSelect
        })
    ));
}
