//! Messages returned by backend tag assignment
//!
//! The assignment rules answer with a success flag and one of these texts.
//! Callers show the text to the user as-is.
//!
//! # Usage
//!
//! ```
//! use tagport_storage::messages::AssignMessages;
//!
//! assert_eq!(AssignMessages::TAG_IN_USE, "This tag is already in use.");
//! ```

/// Assignment result texts.
pub struct AssignMessages;

impl AssignMessages {
    /// The tag was created or reassigned.
    pub const ASSIGNED: &'static str = "Tag assigned successfully";

    /// The tag is active and bound to a record.
    pub const TAG_IN_USE: &'static str = "This tag is already in use.";

    /// The tag is active but bound to nothing.
    ///
    /// Assignment is refused because the record is inconsistent.
    pub const TAG_ACTIVE_UNASSIGNED: &'static str =
        "This tag is active but not assigned to anyone. Please check the data.";

    pub const PARTNER_NOT_FOUND: &'static str = "Partner not found";

    pub const VEHICLE_NOT_FOUND: &'static str = "Vehicle not found";
}
