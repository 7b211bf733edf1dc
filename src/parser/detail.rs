use super::markup::MarkupQuery;

const APPLICATION_NUMBER: &str = "Application number";
const ADDRESS: &str = "Address";
const NATURE_OF_DEVELOPMENT: &str = "Nature of development";
const CLOSING_DATE: &str = "Closing Date";
const LODGEMENT_DATE: [&str; 2] = ["Lodgement date", "Date lodged"];

const VIEW_MAP: &str = "View Map";

/// Raw fields of one detail page. A missing label leaves its field empty.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DetailFields {
    pub application_number: String,
    pub address: String,
    pub description: String,
    pub closing_date: String,
    pub lodged_date: String,
}

pub fn extract(page: &impl MarkupQuery) -> DetailFields {
    let read = |caption: &str| page.labeled_text(caption).unwrap_or_default();

    DetailFields {
        application_number: read(APPLICATION_NUMBER),
        address: clean_address(&read(ADDRESS)),
        description: read(NATURE_OF_DEVELOPMENT),
        closing_date: read(CLOSING_DATE),
        lodged_date: LODGEMENT_DATE
            .iter()
            .find_map(|caption| page.labeled_text(caption))
            .unwrap_or_default(),
    }
}

fn clean_address(raw: &str) -> String {
    raw.replace(VIEW_MAP, "").trim().to_string()
}
