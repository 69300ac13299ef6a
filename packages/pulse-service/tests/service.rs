use std::{
	collections::HashMap,
	sync::{Arc, Mutex},
	time::{Duration, Instant},
};

use serde_json::{Value, json};
use time::macros::datetime;

use pulse_config::Config;
use pulse_domain::{GeoCode, SourceKind, TermDefinition, TimeSeriesPoint, Timeframe};
use pulse_service::{
	BlobStore, BoxFuture, DocumentStore, InitialRequest, Ports, PulseService, RefreshRequest,
	ServiceError, ServiceResult, TermUpdate, TimeSeriesSource, Warehouse, multiplex, sinks,
};
use pulse_storage::models::{GrowthRate, ScoreRow};

const CONFIG: &str = r#"
[service]
http_bind = "127.0.0.1:0"

[storage.postgres]
dsn = "postgres://unused"
pool_max_conns = 1

[storage.documents]
collection = "trends"

[storage.blobs]
bucket = "/tmp/unused"

[storage.warehouse]
scores_table = "trend_scores"
growth_table = "growth_rates"

[sources.mention_volume]
api_base = "http://127.0.0.1:9"
path = "/api/v2/doc/doc"

[sources.search_interest]
api_base = "http://127.0.0.1:9"
"#;

type Call = (String, String, Timeframe);

struct ScriptedSource {
	kind: SourceKind,
	pacing: Option<Duration>,
	responses: HashMap<(String, String), Vec<TimeSeriesPoint>>,
	failing_query: Option<String>,
	calls: Mutex<Vec<Call>>,
}
impl ScriptedSource {
	fn new(kind: SourceKind) -> Self {
		Self {
			kind,
			pacing: None,
			responses: HashMap::new(),
			failing_query: None,
			calls: Mutex::new(Vec::new()),
		}
	}

	fn respond(mut self, query: &str, geo: &str, points: Vec<TimeSeriesPoint>) -> Self {
		self.responses.insert((query.to_string(), geo.to_string()), points);

		self
	}

	fn calls(&self) -> Vec<Call> {
		self.calls.lock().expect("Calls lock poisoned.").clone()
	}
}
impl TimeSeriesSource for ScriptedSource {
	fn kind(&self) -> SourceKind {
		self.kind
	}

	fn pacing(&self, _timeframe: Timeframe) -> Option<Duration> {
		self.pacing
	}

	fn fetch<'a>(
		&'a self,
		query: &'a str,
		geo: &'a str,
		timeframe: Timeframe,
	) -> BoxFuture<'a, pulse_providers::Result<Vec<TimeSeriesPoint>>> {
		Box::pin(async move {
			self.calls.lock().expect("Calls lock poisoned.").push((
				query.to_string(),
				geo.to_string(),
				timeframe,
			));

			if self.failing_query.as_deref() == Some(query) {
				return Err(pulse_providers::Error::RetriesExhausted {
					attempts: 9,
					message: "Upstream returned status 503.".to_string(),
				});
			}

			Ok(self.responses.get(&(query.to_string(), geo.to_string())).cloned().unwrap_or_default())
		})
	}
}

#[derive(Default)]
struct MemoryDocuments {
	docs: Mutex<HashMap<String, Value>>,
}
impl MemoryDocuments {
	fn get(&self, topic: &str) -> Option<Value> {
		self.docs.lock().expect("Docs lock poisoned.").get(topic).cloned()
	}

	fn seed(&self, topic: &str, body: Value) {
		self.docs.lock().expect("Docs lock poisoned.").insert(topic.to_string(), body);
	}
}
impl DocumentStore for MemoryDocuments {
	fn read<'a>(&'a self, topic: &'a str) -> BoxFuture<'a, ServiceResult<Option<Value>>> {
		Box::pin(async move { Ok(self.get(topic)) })
	}

	fn write<'a>(&'a self, topic: &'a str, body: &'a Value) -> BoxFuture<'a, ServiceResult<()>> {
		Box::pin(async move {
			self.seed(topic, body.clone());

			Ok(())
		})
	}
}

#[derive(Default)]
struct MemoryBlobs {
	objects: Mutex<HashMap<String, Vec<u8>>>,
}
impl MemoryBlobs {
	fn text(&self, key: &str) -> Option<String> {
		self.objects
			.lock()
			.expect("Blobs lock poisoned.")
			.get(key)
			.map(|bytes| String::from_utf8_lossy(bytes).into_owned())
	}

	fn seed_json(&self, key: &str, body: Value) {
		self.objects
			.lock()
			.expect("Blobs lock poisoned.")
			.insert(key.to_string(), body.to_string().into_bytes());
	}

	fn len(&self) -> usize {
		self.objects.lock().expect("Blobs lock poisoned.").len()
	}
}
impl BlobStore for MemoryBlobs {
	fn download<'a>(&'a self, key: &'a str) -> BoxFuture<'a, ServiceResult<Option<Vec<u8>>>> {
		Box::pin(async move { Ok(self.objects.lock().expect("Blobs lock poisoned.").get(key).cloned()) })
	}

	fn upload<'a>(&'a self, key: &'a str, bytes: &'a [u8]) -> BoxFuture<'a, ServiceResult<()>> {
		Box::pin(async move {
			self.objects.lock().expect("Blobs lock poisoned.").insert(key.to_string(), bytes.to_vec());

			Ok(())
		})
	}
}

#[derive(Default)]
struct MemoryWarehouse {
	rows: Mutex<Vec<ScoreRow>>,
	growth: Vec<GrowthRate>,
}
impl MemoryWarehouse {
	fn rows(&self) -> Vec<ScoreRow> {
		self.rows.lock().expect("Rows lock poisoned.").clone()
	}
}
impl Warehouse for MemoryWarehouse {
	fn insert_rows<'a>(&'a self, rows: &'a [ScoreRow]) -> BoxFuture<'a, ServiceResult<u64>> {
		Box::pin(async move {
			self.rows.lock().expect("Rows lock poisoned.").extend_from_slice(rows);

			Ok(rows.len() as u64)
		})
	}

	fn growth_rates(&self, limit: u32) -> BoxFuture<'_, ServiceResult<Vec<GrowthRate>>> {
		Box::pin(async move { Ok(self.growth.iter().take(limit as usize).cloned().collect()) })
	}
}

struct Harness {
	service: PulseService,
	mention: Arc<ScriptedSource>,
	interest: Arc<ScriptedSource>,
	docs: Arc<MemoryDocuments>,
	blobs: Arc<MemoryBlobs>,
	warehouse: Arc<MemoryWarehouse>,
}

fn harness(mention: ScriptedSource, interest: ScriptedSource) -> Harness {
	harness_with_warehouse(mention, interest, MemoryWarehouse::default())
}

fn harness_with_warehouse(
	mention: ScriptedSource,
	interest: ScriptedSource,
	warehouse: MemoryWarehouse,
) -> Harness {
	let cfg: Config = toml::from_str(CONFIG).expect("Failed to parse test config.");
	let mention = Arc::new(mention);
	let interest = Arc::new(interest);
	let docs = Arc::new(MemoryDocuments::default());
	let blobs = Arc::new(MemoryBlobs::default());
	let warehouse = Arc::new(warehouse);
	let ports = Ports {
		mention_volume: mention.clone(),
		search_interest: interest.clone(),
		documents: docs.clone(),
		blobs: blobs.clone(),
		warehouse: warehouse.clone(),
	};

	Harness { service: PulseService::new(cfg, ports), mention, interest, docs, blobs, warehouse }
}

fn score(date: &str, value: f64) -> TimeSeriesPoint {
	TimeSeriesPoint { date: date.to_string(), value, normalized_value: None }
}

fn volume(date: &str, value: f64, norm: f64) -> TimeSeriesPoint {
	TimeSeriesPoint { date: date.to_string(), value, normalized_value: Some(norm) }
}

fn initial(topic_singular: &str) -> InitialRequest {
	InitialRequest { topic_singular: topic_singular.to_string(), terms: None, geos: None }
}

fn refresh(topic_singular: &str) -> RefreshRequest {
	RefreshRequest { topic_singular: topic_singular.to_string() }
}

#[tokio::test]
async fn initial_run_emits_only_pairs_with_points() {
	let interest = ScriptedSource::new(SourceKind::SearchInterest).respond(
		"Inflation economy",
		"US",
		vec![score("2024-01-01", 42.0)],
	);
	let h = harness(ScriptedSource::new(SourceKind::MentionVolume), interest);

	h.docs.seed("economy", json!({ "terms": [{ "name": "Inflation" }], "geos": ["WORLD", "US"] }));

	let report =
		h.service.trends_initial("economy", initial("economy")).await.expect("Run failed.");

	assert_eq!(report.records, 1);
	assert_eq!(
		h.blobs.text(sinks::TRENDS_INITIAL_KEY).as_deref(),
		Some("US,Inflation,2024-01-01,42")
	);

	let rows = h.warehouse.rows();

	assert_eq!(rows.len(), 1);
	assert_eq!(rows[0].geo, "US");
	assert_eq!(rows[0].term, "Inflation");
	assert_eq!(rows[0].date, time::macros::date!(2024 - 01 - 01));
	assert_eq!(rows[0].score, 42.0);
	assert_eq!(
		h.interest.calls(),
		vec![
			("Inflation economy".to_string(), String::new(), Timeframe::FiveYears),
			("Inflation economy".to_string(), "US".to_string(), Timeframe::FiveYears),
		]
	);
}

#[tokio::test]
async fn missing_timeline_yields_no_records_and_later_terms_still_run() {
	let mention = ScriptedSource::new(SourceKind::MentionVolume).respond(
		"gamma%20delta%20climate",
		"",
		vec![volume("20240101T000000Z", 5.0, 1.5)],
	);
	let h = harness(mention, ScriptedSource::new(SourceKind::SearchInterest));

	h.blobs.seed_json(
		"output/topic_entities.json",
		json!({ "terms": [{ "Name": "Alpha-Beta" }, { "Name": "Gamma Delta" }] }),
	);

	let report = h.service.news_initial("climate").await.expect("Run failed.");

	assert_eq!(report.records, 1);
	assert_eq!(
		h.blobs.text(sinks::NEWS_INITIAL_KEY).as_deref(),
		Some(" Gamma Delta,20240101T000000Z,5,1.5")
	);
	assert_eq!(
		h.mention.calls().iter().map(|(query, _, _)| query.as_str()).collect::<Vec<_>>(),
		vec!["alpha%20beta%20climate", "gamma%20delta%20climate"]
	);
}

#[tokio::test]
async fn latest_news_keeps_only_yesterday() {
	let mention = ScriptedSource::new(SourceKind::MentionVolume)
		.respond(
			"drought%20climate",
			"",
			vec![volume("20240308T000000Z", 1.0, 0.1), volume("20240309T000000Z", 2.0, 0.2)],
		)
		.respond("flood%20climate", "", vec![volume("20240308T000000Z", 3.0, 0.3)]);
	let h = harness(mention, ScriptedSource::new(SourceKind::SearchInterest));

	h.blobs.seed_json(
		"output/topic_entities.json",
		json!({ "terms": [{ "Name": "Drought" }, { "Name": "Flood" }] }),
	);

	let report = h
		.service
		.news_latest_at("climate", datetime!(2024-03-10 08:30 UTC))
		.await
		.expect("Run failed.");

	assert_eq!(report.records, 1);
	assert_eq!(
		h.blobs.text(sinks::NEWS_UPDATE_KEY).as_deref(),
		Some(" Drought,20240309T000000Z,2,0.2")
	);
	assert!(h.mention.calls().iter().all(|(_, _, timeframe)| *timeframe == Timeframe::TrailingWeek));
}

#[tokio::test]
async fn refresh_appends_last_point_per_pair_and_accumulates() {
	let interest = ScriptedSource::new(SourceKind::SearchInterest).respond(
		"Inflation economy",
		"US",
		vec![score("2024-01-02", 20.0), score("2024-01-01", 10.0)],
	);
	let h = harness(ScriptedSource::new(SourceKind::MentionVolume), interest);

	h.docs.seed(
		"economy",
		json!({
			"owner": "ops",
			"terms": [{
				"name": "Inflation",
				"data": [{ "name": "Inflation", "geo": "US", "score": 5.0, "lastUpdate": "2023-12-01" }]
			}],
			"geos": ["US", "GB"]
		}),
	);

	for _ in 0..2 {
		let report = h.service.trends_refresh("economy", refresh("economy")).await.expect("Run failed.");

		assert_eq!(report.records, 1);
	}

	let doc = h.docs.get("economy").expect("Document missing.");
	let data = doc["terms"][0]["data"].as_array().expect("Data list missing.");

	assert_eq!(doc["owner"], "ops");
	assert_eq!(data.len(), 3);
	assert_eq!(data[0]["lastUpdate"], "2023-12-01");

	for datum in &data[1..] {
		assert_eq!(
			datum,
			&json!({ "name": "Inflation", "geo": "US", "score": 10.0, "lastUpdate": "2024-01-01" })
		);
	}

	assert!(
		h.interest.calls().iter().all(|(_, _, timeframe)| *timeframe == Timeframe::TrailingSevenDays)
	);
}

#[tokio::test]
async fn runs_fail_when_the_document_lacks_terms() {
	let h = harness(
		ScriptedSource::new(SourceKind::MentionVolume),
		ScriptedSource::new(SourceKind::SearchInterest),
	);

	h.docs.seed("economy", json!({ "geos": ["US"] }));

	let err = h.service.trends_all("economy", refresh("economy")).await.expect_err("Run must fail.");

	assert!(matches!(err, ServiceError::DocumentFieldMissing { field: "terms", .. }));

	let err = h.service.trends_refresh("missing", refresh("economy")).await.expect_err("Run must fail.");

	assert!(matches!(err, ServiceError::DocumentFieldMissing { field: "terms", .. }));
	assert!(h.warehouse.rows().is_empty());
	assert!(h.interest.calls().is_empty());
}

#[tokio::test]
async fn runs_fail_when_the_document_lacks_geos() {
	let h = harness(
		ScriptedSource::new(SourceKind::MentionVolume),
		ScriptedSource::new(SourceKind::SearchInterest),
	);

	h.docs.seed("economy", json!({ "terms": [{ "name": "Inflation" }] }));

	let err =
		h.service.trends_initial("economy", initial("economy")).await.expect_err("Run must fail.");

	assert!(matches!(err, ServiceError::DocumentFieldMissing { field: "geos", .. }));
}

#[tokio::test]
async fn term_listing_defaults_missing_fields_to_empty() {
	let h = harness(
		ScriptedSource::new(SourceKind::MentionVolume),
		ScriptedSource::new(SourceKind::SearchInterest),
	);

	h.docs.seed("economy", json!({ "terms": [{ "name": "Inflation" }] }));

	let listing = h.service.list_terms("economy").await.expect("Listing failed.");

	assert_eq!(listing.terms.len(), 1);
	assert_eq!(listing.terms[0].name, "Inflation");
	assert!(listing.geos.is_empty());

	let listing = h.service.list_terms("unknown").await.expect("Listing failed.");

	assert!(listing.terms.is_empty());
	assert!(listing.geos.is_empty());
}

#[tokio::test]
async fn replacing_terms_keeps_unrelated_fields() {
	let h = harness(
		ScriptedSource::new(SourceKind::MentionVolume),
		ScriptedSource::new(SourceKind::SearchInterest),
	);

	h.docs.seed("economy", json!({ "owner": "ops", "terms": [{ "name": "Inflation" }] }));

	let update: TermUpdate = serde_json::from_value(json!({
		"terms": [{ "name": "Jobs" }, { "name": "Wages" }],
		"geos": [" us ", "WORLD"]
	}))
	.expect("Failed to parse update.");
	let listing = h.service.replace_terms("economy", update).await.expect("Replace failed.");

	assert_eq!(listing.geos, vec!["US".to_string(), "WORLD".to_string()]);

	let doc = h.docs.get("economy").expect("Document missing.");

	assert_eq!(doc["owner"], "ops");
	assert_eq!(doc["terms"], json!([{ "name": "Jobs" }, { "name": "Wages" }]));
	assert_eq!(doc["geos"], json!(["US", "WORLD"]));

	let bad: TermUpdate = serde_json::from_value(json!({ "terms": [], "geos": ["Narnia"] }))
		.expect("Failed to parse update.");
	let err = h.service.replace_terms("economy", bad).await.expect_err("Update must fail.");

	assert!(matches!(err, ServiceError::InvalidRequest { .. }));
}

#[tokio::test]
async fn upstream_failure_aborts_before_any_sink_write() {
	let mut interest = ScriptedSource::new(SourceKind::SearchInterest).respond(
		"Inflation economy",
		"US",
		vec![score("2024-01-01", 42.0)],
	);

	interest.failing_query = Some("Wages economy".to_string());

	let h = harness(ScriptedSource::new(SourceKind::MentionVolume), interest);

	h.docs.seed(
		"economy",
		json!({ "terms": [{ "name": "Inflation" }, { "name": "Wages" }], "geos": ["US"] }),
	);

	let err =
		h.service.trends_initial("economy", initial("economy")).await.expect_err("Run must fail.");

	assert!(matches!(
		err,
		ServiceError::UpstreamUnavailable { kind: SourceKind::SearchInterest, .. }
	));
	assert_eq!(h.blobs.len(), 0);
	assert!(h.warehouse.rows().is_empty());
}

#[tokio::test]
async fn initial_body_overrides_the_document() {
	let h = harness(
		ScriptedSource::new(SourceKind::MentionVolume),
		ScriptedSource::new(SourceKind::SearchInterest),
	);
	let req = InitialRequest {
		topic_singular: "economy".to_string(),
		terms: Some(vec!["Jobs".to_string()]),
		geos: Some(vec!["gb".to_string()]),
	};

	h.service.trends_initial("never-written", req).await.expect("Run failed.");

	assert_eq!(
		h.interest.calls(),
		vec![("Jobs economy".to_string(), "GB".to_string(), Timeframe::FiveYears)]
	);
	assert_eq!(h.blobs.text(sinks::TRENDS_INITIAL_KEY).as_deref(), Some(""));
}

#[tokio::test]
async fn legacy_trends_use_default_geos_and_normalized_labels() {
	let interest = ScriptedSource::new(SourceKind::SearchInterest).respond(
		"Inflation economy",
		"",
		vec![score("2024-01-01", 42.0), score("2024-01-08", 40.0)],
	);
	let h = harness(ScriptedSource::new(SourceKind::MentionVolume), interest);

	h.blobs.seed_json("output/topic_entities.json", json!({ "terms": [{ "Name": "Inflation" }] }));

	h.service.trends_latest("economy").await.expect("Run failed.");

	assert_eq!(
		h.blobs.text(sinks::TRENDS_UPDATE_KEY).as_deref(),
		Some("WORLD, Inflation,2024-01-01,42\nWORLD, Inflation,2024-01-08,40")
	);
	assert_eq!(h.interest.calls()[0].2, Timeframe::TrailingMonth);
}

#[tokio::test]
async fn legacy_runs_require_the_entity_catalog() {
	let h = harness(
		ScriptedSource::new(SourceKind::MentionVolume),
		ScriptedSource::new(SourceKind::SearchInterest),
	);
	let err = h.service.news_initial("climate").await.expect_err("Run must fail.");

	assert!(matches!(err, ServiceError::Blob { .. }));

	let err = h.service.news_initial("  ").await.expect_err("Run must fail.");

	assert!(matches!(err, ServiceError::InvalidRequest { .. }));
}

#[tokio::test]
async fn growth_rates_are_returned_and_mirrored() {
	let warehouse = MemoryWarehouse {
		rows: Mutex::new(Vec::new()),
		growth: vec![GrowthRate {
			name: "Inflation".to_string(),
			date: Some("2024-01-14".to_string()),
			growth_rate: Some(0.25),
			trends_growth: Some(0.5),
			news_growth: None,
		}],
	};
	let h = harness_with_warehouse(
		ScriptedSource::new(SourceKind::MentionVolume),
		ScriptedSource::new(SourceKind::SearchInterest),
		warehouse,
	);
	let rows = h.service.growth_rates().await.expect("Growth export failed.");
	let mirrored: Value = serde_json::from_str(
		&h.blobs.text(sinks::GROWTH_RATES_KEY).expect("Growth blob missing."),
	)
	.expect("Growth blob is not JSON.");

	assert_eq!(rows.len(), 1);
	assert_eq!(
		mirrored,
		json!([{
			"name": "Inflation",
			"date": "2024-01-14",
			"growth_rate": 0.25,
			"trends_growth": 0.5,
			"news_growth": null
		}])
	);
}

#[tokio::test]
async fn multiplexer_visits_each_pair_once_and_paces_between_terms() {
	let mut source = ScriptedSource::new(SourceKind::MentionVolume);

	source.pacing = Some(Duration::from_millis(40));

	let terms = ["Drought", "Flood", "Drought", "Heat"].map(TermDefinition::new);
	let geos = [GeoCode::World, GeoCode::World];
	let start = Instant::now();
	let collection =
		multiplex::collect(&source, &terms, &geos, "climate", Timeframe::Unrestricted)
			.await
			.expect("Collection failed.");

	assert!(start.elapsed() >= Duration::from_millis(80));
	assert_eq!((collection.terms, collection.geos), (3, 1));
	assert_eq!(collection.series.len(), 3);
	assert!(collection.series.iter().all(|s| s.points.is_empty()));
	assert_eq!(
		source.calls().iter().map(|(query, geo, _)| (query.as_str(), geo.as_str())).collect::<Vec<_>>(),
		vec![("drought%20climate", ""), ("flood%20climate", ""), ("heat%20climate", "")]
	);
}

#[tokio::test]
async fn multiplexer_rejects_a_timeframe_from_the_other_source() {
	let source = ScriptedSource::new(SourceKind::MentionVolume);
	let terms = [TermDefinition::new("Drought")];
	let err = multiplex::collect(&source, &terms, &[GeoCode::World], "climate", Timeframe::FiveYears)
		.await
		.expect_err("Collection must fail.");

	assert!(matches!(err, ServiceError::InvalidRequest { .. }));
	assert!(source.calls().is_empty());
}

#[tokio::test]
async fn term_names_with_line_breaks_are_rejected() {
	let h = harness(
		ScriptedSource::new(SourceKind::MentionVolume),
		ScriptedSource::new(SourceKind::SearchInterest),
	);
	let update: TermUpdate = serde_json::from_value(json!({ "terms": [{ "name": "Foo\nBar" }] }))
		.expect("Failed to parse update.");
	let err = h.service.replace_terms("economy", update).await.expect_err("Update must fail.");

	assert!(matches!(err, ServiceError::InvalidRequest { .. }));
	assert!(h.docs.get("economy").is_none());

	let req = InitialRequest {
		topic_singular: "economy".to_string(),
		terms: Some(vec!["Foo\r\nBar".to_string()]),
		geos: Some(vec!["US".to_string()]),
	};
	let err = h.service.trends_initial("economy", req).await.expect_err("Run must fail.");

	assert!(matches!(err, ServiceError::InvalidRequest { .. }));
	assert!(h.interest.calls().is_empty());
	assert_eq!(h.blobs.len(), 0);
}

#[tokio::test]
async fn stored_names_with_line_breaks_stay_on_one_line() {
	let interest = ScriptedSource::new(SourceKind::SearchInterest).respond(
		"Foo Bar economy",
		"GB\nENG",
		vec![score("2024-01-01", 42.0)],
	);
	let h = harness(ScriptedSource::new(SourceKind::MentionVolume), interest);

	h.docs.seed("economy", json!({ "terms": [{ "name": "Foo\nBar" }], "geos": ["GB\nENG"] }));

	let report =
		h.service.trends_initial("economy", initial("economy")).await.expect("Run failed.");
	let text = h.blobs.text(sinks::TRENDS_INITIAL_KEY).expect("Initial CSV missing.");

	assert_eq!(report.records, 1);
	assert_eq!(text.lines().count(), 1);
	assert_eq!(text, "GB ENG,Foo Bar,2024-01-01,42");
}

#[tokio::test]
async fn reports_count_distinct_terms_and_geos() {
	let h = harness(
		ScriptedSource::new(SourceKind::MentionVolume),
		ScriptedSource::new(SourceKind::SearchInterest),
	);

	h.docs.seed(
		"economy",
		json!({
			"terms": [{ "name": "Jobs" }, { "name": "Wages" }, { "name": "Jobs" }],
			"geos": ["US", "US", "WORLD"]
		}),
	);

	let report = h.service.trends_all("economy", refresh("economy")).await.expect("Run failed.");

	assert_eq!((report.terms, report.geos), (2, 2));
	assert_eq!(h.interest.calls().len(), 4);
}
