//! One record type for every entity the back-office tables manage.
//!
//! Each variant maps its row to the fields its table searches over. The
//! mapping is deliberate: an order is searched by its number and email, never
//! by its internal ids, and money and dates are matched against their display
//! forms.

use serde::Serialize;

use crate::store::{CategoryRow, CouponRow, OrderRow, ProductRow, ReviewRow, UserRow};

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum AdminRecord {
    User(UserRow),
    Category(CategoryRow),
    Coupon(CouponRow),
    Product(ProductRow),
    Order(OrderRow),
    Review(ReviewRow),
}

impl AdminRecord {
    /// The text a search term is matched against, one string per searchable
    /// column.
    pub fn searchable_fields(&self) -> Vec<String> {
        match self {
            Self::User(u) => vec![u.name.clone(), u.email.clone()],
            Self::Category(c) => vec![c.name.clone(), c.slug.clone()],
            Self::Coupon(c) => vec![
                c.code.clone(),
                c.kind.clone(),
                c.value.to_string(),
                c.expires_at.to_rfc3339(),
            ],
            Self::Product(p) => {
                let mut fields = vec![
                    p.sku.clone(),
                    p.name.clone(),
                    p.price.to_string(),
                    p.status.clone(),
                ];
                if let Some(description) = &p.description {
                    fields.push(description.clone());
                }
                fields
            }
            Self::Order(o) => vec![
                o.order_number.clone(),
                o.customer_email.clone(),
                o.status.clone(),
                o.total.to_string(),
                o.created_at.to_rfc3339(),
            ],
            Self::Review(r) => vec![r.author.clone(), r.comment.clone(), r.rating.to_string()],
        }
    }
}
