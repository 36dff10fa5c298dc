#[derive(Debug, Clone)]
pub(crate) struct Customer {
    pub(crate) id: Option<i64>,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl Customer {
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

    /// Find a customer by name (case-insensitive) in a slice.
    pub(crate) fn find_by_name<'a>(customers: &'a [Customer], name: &str) -> Option<&'a Customer> {
        let lower = name.trim().to_lowercase();
        customers.iter().find(|c| c.name.to_lowercase() == lower)
    }

    pub(crate) fn find_by_id(customers: &[Customer], id: i64) -> Option<&Customer> {
        customers.iter().find(|c| c.id == Some(id))
    }
}

impl std::fmt::Display for Customer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Partial update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub(crate) struct CustomerUpdate {
    pub(crate) name: Option<String>,
    pub(crate) description: Option<String>,
}
