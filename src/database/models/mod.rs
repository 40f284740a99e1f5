pub mod campaign;
pub mod character;
pub mod class;
pub mod feature;
pub mod item;
pub mod race;
pub mod spell;
pub mod subclass;
pub mod user;

pub use campaign::Campaign;
pub use character::Character;
pub use class::Class;
pub use feature::Feature;
pub use item::Item;
pub use race::Race;
pub use spell::Spell;
pub use subclass::Subclass;
pub use user::User;
