//! Store to region classification.

pub const HEADQUARTERS_PATTERN: &str = "Casa Matriz";
pub const BRANCHES_PATTERN: &str = "Sucursales";
pub const UNASSIGNED_REGION: &str = "Sin region";

/// Fixed store-id lookup. Headquarters stores map one-to-one, branches are
/// grouped by zone.
pub const REGION_TABLE: &[(&str, &[i64])] = &[
    ("Valencia Casa Matriz", &[2003]),
    ("Oriente - Casa Matriz", &[2005]),
    ("Occidente - Casa Matriz", &[2004]),
    ("Margarita - Casa Matriz", &[2006]),
    (
        "Oriente - Sucursales",
        &[
            1, 1002, 1004, 1006, 1009, 1010, 1011, 1012, 1013, 1014, 1017, 1018, 1019, 1020, 1021,
            1022, 1023, 1024,
        ],
    ),
    (
        "Occidente - Sucursales",
        &[
            1026, 1027, 1028, 1029, 1030, 1031, 1037, 1038, 1039, 1040, 1041, 1042, 1043, 1044,
            1045, 1046, 1047, 1048, 1050, 1052, 1053, 1055, 2007,
        ],
    ),
    ("Margarita - Sucursales", &[1032, 1033, 1034, 1035, 1036]),
];

pub fn region_for_store(store_id: i64) -> &'static str {
    REGION_TABLE
        .iter()
        .find(|(_, stores)| stores.contains(&store_id))
        .map(|(region, _)| *region)
        .unwrap_or(UNASSIGNED_REGION)
}

pub fn is_headquarters(region: &str) -> bool {
    region.contains(HEADQUARTERS_PATTERN)
}

pub fn is_branch(region: &str) -> bool {
    region.contains(BRANCHES_PATTERN)
}

/// SQL `CASE` expression deriving the region label from `column`.
pub fn region_case_sql(column: &str) -> String {
    let mut sql = String::from("CASE");
    for (region, stores) in REGION_TABLE {
        let ids = stores
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        sql.push_str(&format!(" WHEN {column} IN ({ids}) THEN '{region}'"));
    }
    sql.push_str(&format!(" ELSE '{UNASSIGNED_REGION}' END"));
    sql
}
