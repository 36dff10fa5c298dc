#[derive(Debug, Clone)]
pub(crate) struct Project {
    pub(crate) id: Option<i64>,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl Project {
    pub(crate) fn new(name: String, description: Option<String>) -> Self {
        let now = super::timestamp();
        Self {
            id: None,
            name,
            description: description.filter(|d| !d.trim().is_empty()),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

impl std::fmt::Display for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ProjectUpdate {
    pub(crate) name: Option<String>,
    pub(crate) description: Option<String>,
}
