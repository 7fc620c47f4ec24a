use interfaces_couchdb_documents::index::CouchClient;
use interfaces_zcoin_rpc::index::ZcoinRpcClient;
use projects_dashboard::config::Config;
use projects_dashboard::scan::scan_znodes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let config = Config::from_env()?;

	utils_trace::init(config.log_level(), config.log_format)?;

	let rpc = ZcoinRpcClient::new(&config.rpc);
	let couch = CouchClient::new(&config.couchdb_url);

	let summary = scan_znodes(&rpc, &couch).await?;
	println!(
		"saved {} znodes ({} conflicts, {} skipped)",
		summary.saved, summary.conflicts, summary.skipped
	);

	Ok(())
}
