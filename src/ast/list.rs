use super::Value;

/// An iterator over the elements of a pair chain.
///
/// This struct is created by [`Value::iter`]. It yields the `first` of
/// each pair and stops at the first `rest` that is not a pair, so an
/// improper tail is never yielded (see [`Value::list_tail`]).
pub struct ListIter<'a> {
    current: &'a Value,
}

impl<'a> Iterator for ListIter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        match self.current {
            Value::Pair(pair) => {
                self.current = &pair.rest;
                Some(&pair.first)
            }
            _ => None,
        }
    }
}

impl Value {
    /// Builds a proper list from a sequence of values.
    pub fn list<I>(items: I) -> Value
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: DoubleEndedIterator,
    {
        Value::improper(items, Value::Null)
    }

    /// Builds a list whose final `rest` is `tail` instead of `Null`.
    pub fn improper<I>(items: I, tail: Value) -> Value
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: DoubleEndedIterator,
    {
        items
            .into_iter()
            .rev()
            .fold(tail, |rest, first| Value::cons(first, rest))
    }

    /// Iterates a pair chain. Non-pairs yield nothing.
    pub fn iter(&self) -> ListIter<'_> {
        ListIter { current: self }
    }

    /// Number of elements in the pair chain, ignoring an improper tail.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        !self.is_pair()
    }

    /// Whatever terminates the chain: `Null` for a proper list.
    pub fn list_tail(&self) -> &Value {
        let mut cursor = self;
        while let Value::Pair(pair) = cursor {
            cursor = &pair.rest;
        }
        cursor
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.iter().cloned().collect()
    }

    pub fn nth(&self, index: usize) -> Option<&Value> {
        self.iter().nth(index)
    }

    pub fn second(&self) -> Option<&Value> {
        self.nth(1)
    }

    pub fn third(&self) -> Option<&Value> {
        self.nth(2)
    }

    /// The chain after skipping `count` pairs; `None` when it runs out first.
    pub fn skip(&self, count: usize) -> Option<&Value> {
        let mut cursor = self;
        for _ in 0..count {
            cursor = cursor.rest()?;
        }
        Some(cursor)
    }

    /// Copies the elements of `self` in front of `tail`.
    pub fn append(&self, tail: Value) -> Value {
        Value::improper(self.to_vec(), tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> Value {
        Value::list(vec!["a".into(), "b".into(), "c".into()])
    }

    #[test]
    fn iterates_and_indexes() {
        let list = abc();
        let items: Vec<&str> = list.iter().filter_map(Value::as_atom).collect();
        assert_eq!(items, vec!["a", "b", "c"]);
        assert_eq!(list.len(), 3);
        assert_eq!(list.second(), Some(&Value::atom("b")));
        assert_eq!(list.third(), Some(&Value::atom("c")));
        assert_eq!(list.nth(3), None);
        assert!(Value::Null.is_empty());
    }

    #[test]
    fn skip_walks_rests() {
        let list = abc();
        assert_eq!(list.skip(2).map(Value::len), Some(1));
        assert_eq!(list.skip(3), Some(&Value::Null));
        assert_eq!(list.skip(4), None);
    }

    #[test]
    fn append_and_improper_tails() {
        let joined = abc().append(Value::list(vec!["d".into()]));
        assert_eq!(joined.pretty(), "(a b c d)");

        let dotted = Value::improper(vec!["a".into()], "b".into());
        assert_eq!(dotted.len(), 1);
        assert_eq!(dotted.list_tail(), &Value::atom("b"));
        assert_eq!(abc().list_tail(), &Value::Null);
    }
}
