pub mod booking;
pub mod movie;
pub mod screen;
pub mod seat_map;
pub mod showtime;
pub mod theater;
pub mod user;

pub use booking::{Booking, BookingStatus, PaymentMethod, PaymentStatus, ResolvedBooking};
pub use movie::{Movie, ReleaseStatus};
pub use screen::Screen;
pub use seat_map::{grid_labels, PremiumPricing, SeatMap};
pub use showtime::{Showtime, ShowtimeStatus};
pub use theater::Theater;
pub use user::User;
