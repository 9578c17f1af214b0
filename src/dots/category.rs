use crate::dots::error::DotsError;

/// Demographic category of a single dot: Hispanic/non-Hispanic crossed
/// with the seven census race groupings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    NonHispanicWhite,
    NonHispanicBlack,
    NonHispanicNative,
    NonHispanicAsian,
    NonHispanicPacific,
    NonHispanicOther,
    NonHispanicMultiple,
    HispanicWhite,
    HispanicBlack,
    HispanicNative,
    HispanicAsian,
    HispanicPacific,
    HispanicOther,
    HispanicMultiple,
}

impl Category {
    /// All categories, in the canonical attribute-column order.
    pub const ALL: [Category; 14] = [
        Category::NonHispanicWhite,
        Category::NonHispanicBlack,
        Category::NonHispanicNative,
        Category::NonHispanicAsian,
        Category::NonHispanicPacific,
        Category::NonHispanicOther,
        Category::NonHispanicMultiple,
        Category::HispanicWhite,
        Category::HispanicBlack,
        Category::HispanicNative,
        Category::HispanicAsian,
        Category::HispanicPacific,
        Category::HispanicOther,
        Category::HispanicMultiple,
    ];

    /// Attribute-column key for this category (e.g. `no_hsp_wh`).
    pub fn key(self) -> &'static str {
        match self {
            Category::NonHispanicWhite => "no_hsp_wh",
            Category::NonHispanicBlack => "no_hsp_bl",
            Category::NonHispanicNative => "no_hsp_nat",
            Category::NonHispanicAsian => "no_hsp_as",
            Category::NonHispanicPacific => "no_hsp_pa",
            Category::NonHispanicOther => "no_hsp_oth",
            Category::NonHispanicMultiple => "no_hsp_mlt",
            Category::HispanicWhite => "hsp_wh",
            Category::HispanicBlack => "hsp_bl",
            Category::HispanicNative => "hsp_nat",
            Category::HispanicAsian => "hsp_as",
            Category::HispanicPacific => "hsp_pa",
            Category::HispanicOther => "hsp_oth",
            Category::HispanicMultiple => "hsp_mlt",
        }
    }

    /// Parse a canonical key back into a category.
    pub fn from_key(key: &str) -> Result<Category, DotsError> {
        Category::ALL
            .into_iter()
            .find(|category| category.key() == key)
            .ok_or_else(|| DotsError::UnknownCategory { key: key.to_string() })
    }
}

/// Per-category population counts for one feature.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryCounts([u64; 14]);

impl CategoryCounts {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, category: Category) -> u64 {
        self.0[category as usize]
    }

    #[inline]
    pub fn set(&mut self, category: Category, count: u64) {
        self.0[category as usize] = count;
    }

    /// Sum of all category counts. This drives how many points are sampled.
    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }

    /// Iterate (category, count) pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, u64)> + '_ {
        Category::ALL.into_iter().map(|category| (category, self.get(category)))
    }
}

impl FromIterator<(Category, u64)> for CategoryCounts {
    fn from_iter<T: IntoIterator<Item = (Category, u64)>>(iter: T) -> Self {
        let mut counts = CategoryCounts::new();
        for (category, count) in iter {
            counts.set(category, count);
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::{Category, CategoryCounts};

    #[test]
    fn keys_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_key(category.key()).unwrap(), category);
        }
        assert!(Category::from_key("hsp_xx").is_err());
    }

    #[test]
    fn canonical_order() {
        assert_eq!(Category::ALL[0].key(), "no_hsp_wh");
        assert_eq!(Category::ALL[7].key(), "hsp_wh");
        assert_eq!(Category::ALL[13].key(), "hsp_mlt");
    }

    #[test]
    fn counts_total() {
        let mut counts = CategoryCounts::new();
        counts.set(Category::HispanicWhite, 3);
        counts.set(Category::HispanicBlack, 2);
        assert_eq!(counts.total(), 5);
        assert_eq!(counts.get(Category::NonHispanicWhite), 0);
        assert_eq!(counts.iter().filter(|&(_, n)| n > 0).count(), 2);
    }
}
