use chrono::NaiveDate;

/// JQLクエリ文字列を構築する純粋関数
///
/// プロジェクトキーは常に引用符付きの完全一致条件になる。日付境界は
/// 指定されたものだけがcreated範囲条件として付加される（片側のみの
/// 指定でも空文字列の境界を出力しない）。
pub fn build_query(
    project_key: &str,
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
) -> String {
    let mut conditions = vec![format!("project = \"{}\"", project_key)];

    if let Some(from) = date_from {
        conditions.push(format!("created >= \"{}\"", from.format("%Y-%m-%d")));
    }

    if let Some(to) = date_to {
        conditions.push(format!("created <= \"{}\"", to.format("%Y-%m-%d")));
    }

    conditions.join(" AND ")
}
