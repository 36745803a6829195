use std::fmt;
use std::str::FromStr;

/// Dashboard collections served under the API base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminResource {
    Products,
    Combos,
    Orders,
    Customers,
    Contacts,
    Franchise,
    Events,
    Discounts,
    Reviews,
    Newsletter,
    Analytics,
    /// Blog posts, including drafts
    Blog,
}

impl AdminResource {
    pub const ALL: [AdminResource; 12] = [
        AdminResource::Products,
        AdminResource::Combos,
        AdminResource::Orders,
        AdminResource::Customers,
        AdminResource::Contacts,
        AdminResource::Franchise,
        AdminResource::Events,
        AdminResource::Discounts,
        AdminResource::Reviews,
        AdminResource::Newsletter,
        AdminResource::Analytics,
        AdminResource::Blog,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AdminResource::Products => "products",
            AdminResource::Combos => "combos",
            AdminResource::Orders => "orders",
            AdminResource::Customers => "customers",
            AdminResource::Contacts => "contacts",
            AdminResource::Franchise => "franchise",
            AdminResource::Events => "events",
            AdminResource::Discounts => "discounts",
            AdminResource::Reviews => "reviews",
            AdminResource::Newsletter => "newsletter",
            AdminResource::Analytics => "analytics",
            AdminResource::Blog => "blog",
        }
    }

    /// Path listing the collection
    pub fn list_path(&self) -> &'static str {
        match self {
            // Analytics exposes a single stats document rather than a list
            AdminResource::Analytics => "/analytics/stats",
            // Admin listing includes unpublished posts
            AdminResource::Blog => "/posts/admin/all",
            AdminResource::Products => "/products",
            AdminResource::Combos => "/combos",
            AdminResource::Orders => "/orders",
            AdminResource::Customers => "/customers",
            AdminResource::Contacts => "/contacts",
            AdminResource::Franchise => "/franchise",
            AdminResource::Events => "/events",
            AdminResource::Discounts => "/discounts",
            AdminResource::Reviews => "/reviews",
            AdminResource::Newsletter => "/newsletter",
        }
    }

    pub fn item_path(&self, id: &str) -> String {
        match self {
            AdminResource::Blog => format!("/posts/{}", id),
            other => format!("/{}/{}", other.name(), id),
        }
    }

    /// Whether the backend accepts `PATCH /<resource>/<id>/status`
    pub fn has_status(&self) -> bool {
        matches!(
            self,
            AdminResource::Contacts | AdminResource::Franchise | AdminResource::Events
        )
    }
}

impl fmt::Display for AdminResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AdminResource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        AdminResource::ALL
            .iter()
            .copied()
            .find(|r| r.name() == wanted)
            .ok_or_else(|| {
                let known: Vec<_> = AdminResource::ALL.iter().map(|r| r.name()).collect();
                format!("Unknown resource '{}'. Known: {}", s, known.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resource() {
        assert_eq!("Orders".parse::<AdminResource>(), Ok(AdminResource::Orders));
        assert!("menus".parse::<AdminResource>().unwrap_err().contains("products"));
    }

    #[test]
    fn test_paths() {
        assert_eq!(AdminResource::Analytics.list_path(), "/analytics/stats");
        assert_eq!(AdminResource::Contacts.item_path("42"), "/contacts/42");
        assert!(AdminResource::Events.has_status());
        assert!(!AdminResource::Products.has_status());
    }

    #[test]
    fn test_blog_posts_live_under_posts() {
        assert_eq!("blog".parse::<AdminResource>(), Ok(AdminResource::Blog));
        assert_eq!(AdminResource::Blog.list_path(), "/posts/admin/all");
        assert_eq!(AdminResource::Blog.item_path("abc"), "/posts/abc");
        assert!(!AdminResource::Blog.has_status());
    }
}
