use serde_json::json;

use crate::{Error, PostId, FIELD_CREATED_AT, FIELD_POST_ID};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Filter {
    Equal(String, String),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Order {
    Asc(String),
    Desc(String),
}

/// A query over one collection of the document service
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    /// All the comments of `post`, oldest first
    pub fn comments_of(post: &PostId) -> Query {
        Query {
            filters: vec![Filter::Equal(String::from(FIELD_POST_ID), post.0.clone())],
            order: Some(Order::Asc(String::from(FIELD_CREATED_AT))),
            limit: None,
        }
    }

    /// Encodes this query as the list of clauses sent in `queries[]` parameters
    pub fn to_clauses(&self) -> Vec<String> {
        let mut res = Vec::with_capacity(self.filters.len() + 2);
        for f in &self.filters {
            match f {
                Filter::Equal(attr, value) => res.push(
                    json!({ "method": "equal", "attribute": attr, "values": [value] }).to_string(),
                ),
            }
        }
        match &self.order {
            None => (),
            Some(Order::Asc(attr)) => {
                res.push(json!({ "method": "orderAsc", "attribute": attr }).to_string())
            }
            Some(Order::Desc(attr)) => {
                res.push(json!({ "method": "orderDesc", "attribute": attr }).to_string())
            }
        }
        if let Some(limit) = self.limit {
            res.push(json!({ "method": "limit", "values": [limit] }).to_string());
        }
        res
    }

    /// Parses back the clauses generated by `to_clauses`
    pub fn from_clauses<S: AsRef<str>>(clauses: &[S]) -> Result<Query, Error> {
        let mut res = Query::default();
        for c in clauses {
            let c = c.as_ref();
            let invalid = || Error::InvalidQuery(String::from(c));
            let data: serde_json::Value = serde_json::from_str(c).map_err(|_| invalid())?;
            let method = data.get("method").and_then(|m| m.as_str());
            let attribute = data.get("attribute").and_then(|a| a.as_str());
            let first_value = data
                .get("values")
                .and_then(|v| v.as_array())
                .and_then(|v| v.first());
            match (method, attribute) {
                (Some("equal"), Some(attr)) => {
                    let value = first_value.and_then(|v| v.as_str()).ok_or_else(invalid)?;
                    res.filters
                        .push(Filter::Equal(String::from(attr), String::from(value)));
                }
                (Some("orderAsc"), Some(attr)) => res.order = Some(Order::Asc(String::from(attr))),
                (Some("orderDesc"), Some(attr)) => {
                    res.order = Some(Order::Desc(String::from(attr)))
                }
                (Some("limit"), _) => {
                    let limit = first_value.and_then(|v| v.as_u64()).ok_or_else(invalid)?;
                    res.limit = Some(usize::try_from(limit).map_err(|_| invalid())?);
                }
                _ => return Err(invalid()),
            }
        }
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_of_post() {
        let q = Query::comments_of(&PostId::new("p1"));
        let clauses = q
            .to_clauses()
            .iter()
            .map(|c| serde_json::from_str::<serde_json::Value>(c).expect("clause is json"))
            .collect::<Vec<_>>();
        assert_eq!(
            clauses,
            vec![
                json!({ "method": "equal", "attribute": "postId", "values": ["p1"] }),
                json!({ "method": "orderAsc", "attribute": "createdAt" }),
            ]
        );
        assert_eq!(Query::from_clauses(&q.to_clauses()), Ok(q));
    }

    #[test]
    fn limit_and_desc() {
        let q = Query {
            filters: vec![Filter::Equal(String::from("userId"), String::from("u\"1"))],
            order: Some(Order::Desc(String::from("createdAt"))),
            limit: Some(25),
        };
        assert_eq!(Query::from_clauses(&q.to_clauses()), Ok(q));
    }

    #[test]
    fn invalid_clauses() {
        assert!(matches!(
            Query::from_clauses(&["not json"]),
            Err(Error::InvalidQuery(_))
        ));
        assert!(matches!(
            Query::from_clauses(&[r#"{"method":"search","attribute":"content"}"#]),
            Err(Error::InvalidQuery(_))
        ));
        assert!(matches!(
            Query::from_clauses(&[r#"{"method":"equal","attribute":"postId"}"#]),
            Err(Error::InvalidQuery(_))
        ));
        for limit in ["-1", "1.5", "\"10\"", "18446744073709551616"] {
            let clause = format!(r#"{{"method":"limit","values":[{limit}]}}"#);
            assert!(matches!(
                Query::from_clauses(&[clause]),
                Err(Error::InvalidQuery(_))
            ));
        }
        #[cfg(target_pointer_width = "32")]
        assert!(matches!(
            Query::from_clauses(&[format!(
                r#"{{"method":"limit","values":[{}]}}"#,
                u64::MAX
            )]),
            Err(Error::InvalidQuery(_))
        ));
    }
}
