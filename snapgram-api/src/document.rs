/// Body of a document creation request
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocument<T> {
    pub document_id: String,
    pub data: T,
}

/// Response to a document listing request
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct DocumentList<T> {
    pub total: usize,
    pub documents: Vec<T>,
}
