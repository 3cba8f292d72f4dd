use crate::domain::{Contact, ContactId};
use std::collections::HashSet;

/// Contacts in call order. A contact appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialerQueue {
    items: Vec<Contact>,
}

impl DialerQueue {
    pub fn new(items: Vec<Contact>) -> Self {
        let mut seen = HashSet::new();
        let items = items
            .into_iter()
            .filter(|item| seen.insert(item.id.clone()))
            .collect();
        Self { items }
    }

    pub fn items(&self) -> &[Contact] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&Contact> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn position(&self, contact_id: &ContactId) -> Option<usize> {
        self.items.iter().position(|item| &item.id == contact_id)
    }
}

#[cfg(test)]
mod tests {
    use super::DialerQueue;
    use crate::domain::{Contact, ContactId};

    fn contact(id: &str) -> Contact {
        Contact {
            id: ContactId::new(id).unwrap(),
            display_name: id.to_uppercase(),
            phone: Some("555-0100".to_string()),
            company: None,
        }
    }

    #[test]
    fn keeps_first_occurrence_of_duplicates() {
        let queue = DialerQueue::new(vec![contact("a"), contact("b"), contact("a")]);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.get(1).unwrap().id.as_str(), "b");
    }

    #[test]
    fn position_finds_contact() {
        let queue = DialerQueue::new(vec![contact("a"), contact("b")]);
        assert_eq!(queue.position(&ContactId::new("b").unwrap()), Some(1));
        assert_eq!(queue.position(&ContactId::new("z").unwrap()), None);
    }
}
