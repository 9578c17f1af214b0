use crate::dots::Category;

/// Canvas background; majority-group dots are drawn in it so minority
/// groups stand out, matching the published map style.
pub const BACKGROUND: [u8; 3] = [0, 0, 0];

const ORANGE: [u8; 3] = [255, 165, 0];
const PINK: [u8; 3] = [255, 192, 203];
const BLUE: [u8; 3] = [0, 0, 255];
const LIME: [u8; 3] = [0, 255, 0];
const RED: [u8; 3] = [255, 0, 0];
const AQUA: [u8; 3] = [0, 255, 255];

/// Color key for dot categories.
pub fn color_for(category: Category) -> [u8; 3] {
    match category {
        Category::NonHispanicWhite => BACKGROUND,
        Category::NonHispanicBlack => BACKGROUND,
        Category::NonHispanicNative => ORANGE,
        Category::NonHispanicAsian => PINK,
        Category::NonHispanicPacific => BLUE,
        Category::NonHispanicOther => BLUE,
        Category::NonHispanicMultiple => BLUE,
        Category::HispanicWhite => LIME,
        Category::HispanicBlack => RED,
        Category::HispanicNative => AQUA,
        Category::HispanicAsian => BLUE,
        Category::HispanicPacific => BLUE,
        Category::HispanicOther => BLUE,
        Category::HispanicMultiple => BLUE,
    }
}
