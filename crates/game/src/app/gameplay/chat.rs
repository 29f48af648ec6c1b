use crate::content::ChatDef;

/// Canned chat responses: an ordered keyword table. The first entry whose
/// keyword is a substring of the (lower-cased, trimmed) input wins, so
/// earlier entries shadow later ones.
#[derive(Debug, Clone)]
pub(crate) struct ChatTable {
    responses: Vec<(String, String)>,
    default_response: String,
}

impl ChatTable {
    pub(crate) fn from_def(def: &ChatDef) -> Self {
        Self {
            responses: def
                .responses
                .iter()
                .map(|(keyword, response)| (keyword.to_lowercase(), response.clone()))
                .collect(),
            default_response: def.default_response.clone(),
        }
    }

    /// None for blank input; blank lines are a no-op, not a default reply.
    pub(crate) fn respond(&self, input: &str) -> Option<&str> {
        let normalized = input.to_lowercase();
        let normalized = normalized.trim();
        if normalized.is_empty() {
            return None;
        }
        let matched = self
            .responses
            .iter()
            .find(|(keyword, _)| normalized.contains(keyword.as_str()))
            .map(|(_, response)| response.as_str());
        Some(matched.unwrap_or(self.default_response.as_str()))
    }
}
