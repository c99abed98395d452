pub mod academic_report;
pub mod message;
pub mod notification;
pub mod student;
pub mod tutoring_session;
pub mod user;

pub use academic_report::{
    Entity as AcademicReport, Model as AcademicReportModel, NewAcademicReport,
};
pub use message::{
    ConversationKind, Entity as Message, InboxEntry, Model as MessageModel, NewMessage,
};
pub use notification::{
    Entity as Notification, Model as NotificationModel, NewNotification, NotificationKind,
    NotificationPayload, Priority,
};
pub use student::{Entity as StudentProfile, Model as StudentProfileModel, RiskLevel};
pub use tutoring_session::{
    Entity as TutoringSession, Model as TutoringSessionModel, NewTutoringSession, SessionKind,
};
pub use user::{Entity as User, Model as UserModel, NewUser, Role};
