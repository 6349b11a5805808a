use serde::Serialize;
use std::fmt;

/// Historical scores for one category, always sorted descending.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ScoreList(Vec<f64>);

impl ScoreList {
    /// Build a list from scores in any order.
    pub fn from_unsorted(mut scores: Vec<f64>) -> Self {
        scores.sort_by(|a, b| b.total_cmp(a));
        Self(scores)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Highest historical score, if any
    pub fn top(&self) -> Option<f64> {
        self.0.first().copied()
    }
}

/// Which historical column a list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Per-contestant individual round scores
    Individual,
    /// Team composites of the individual round
    TeamIndividual,
    Guts,
    Relay,
    /// Sum of normalized event scores
    Overall,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Individual,
        Category::TeamIndividual,
        Category::Guts,
        Category::Relay,
        Category::Overall,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Individual => "Individual",
            Category::TeamIndividual => "Team Individual",
            Category::Guts => "Guts",
            Category::Relay => "Relay",
            Category::Overall => "Overall",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// All historical lists for a session. Read-only once loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct History {
    pub individual: ScoreList,
    pub team_individual: ScoreList,
    pub guts: ScoreList,
    pub relay: ScoreList,
    pub overall: ScoreList,
}

impl History {
    pub fn get(&self, category: Category) -> &ScoreList {
        match category {
            Category::Individual => &self.individual,
            Category::TeamIndividual => &self.team_individual,
            Category::Guts => &self.guts,
            Category::Relay => &self.relay,
            Category::Overall => &self.overall,
        }
    }

    pub fn set(&mut self, category: Category, list: ScoreList) {
        match category {
            Category::Individual => self.individual = list,
            Category::TeamIndividual => self.team_individual = list,
            Category::Guts => self.guts = list,
            Category::Relay => self.relay = list,
            Category::Overall => self.overall = list,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_unsorted_sorts_descending() {
        let list = ScoreList::from_unsorted(vec![3.0, 15.0, 7.5, 15.0]);
        assert_eq!(list.as_slice(), &[15.0, 15.0, 7.5, 3.0]);
        assert_eq!(list.top(), Some(15.0));
    }

    #[test]
    fn test_empty_list() {
        let list = ScoreList::default();
        assert!(list.is_empty());
        assert_eq!(list.top(), None);
    }

    #[test]
    fn test_history_get_set() {
        let mut history = History::default();
        history.set(Category::Guts, ScoreList::from_unsorted(vec![12.0, 18.0]));

        assert_eq!(history.get(Category::Guts).as_slice(), &[18.0, 12.0]);
        assert!(history.get(Category::Relay).is_empty());
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(Category::TeamIndividual.to_string(), "Team Individual");
        assert_eq!(Category::ALL.len(), 5);
    }
}
