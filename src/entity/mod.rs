pub mod audit_logs;
pub mod cart_items;
pub mod course_schedules;
pub mod courses;
pub mod engagements;
pub mod enrollments;
pub mod order_items;
pub mod orders;
pub mod pet_profiles;
pub mod platform_settings;
pub mod platform_settings_history;
pub mod posts;
pub mod products;
pub mod reels;
pub mod shipping_addresses;
pub mod users;
pub mod variants;

pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use course_schedules::Entity as CourseSchedules;
pub use courses::Entity as Courses;
pub use engagements::Entity as Engagements;
pub use enrollments::Entity as Enrollments;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use pet_profiles::Entity as PetProfiles;
pub use platform_settings::Entity as PlatformSettings;
pub use platform_settings_history::Entity as PlatformSettingsHistory;
pub use posts::Entity as Posts;
pub use products::Entity as Products;
pub use reels::Entity as Reels;
pub use shipping_addresses::Entity as ShippingAddresses;
pub use users::Entity as Users;
pub use variants::Entity as Variants;
