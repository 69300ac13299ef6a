pub fn render_schema(scores_table: &str) -> String {
	let init = include_str!("../../../sql/init.sql");
	let expanded = expand_includes(init);

	expanded
		.replace("<SCORES_INDEX>", &index_name(scores_table))
		.replace("<SCORES_TABLE>", scores_table)
}

fn index_name(table: &str) -> String {
	format!("{}_term_geo_date_idx", table.replace('.', "_"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_documents.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_documents.sql")),
				"tables/002_trend_scores.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_trend_scores.sql")),
				_ => {
					out.push_str(line);
					out.push('\n');
				},
			}

			continue;
		}

		out.push_str(line);
		out.push('\n');
	}

	out
}
