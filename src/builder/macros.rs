//! Macros for declaring state and event tags.

/// Generate a `Copy` enum and its State trait implementation.
///
/// # Example
///
/// ```
/// use junction::state_enum;
///
/// state_enum! {
///     pub enum PumpState {
///         Closed,
///         Open,
///         Jammed,
///     }
///     error: [Jammed]
/// }
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }

        $(final: [$($final:ident),* $(,)?])?
        $(error: [$($error:ident),* $(,)?])?
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$(Self::$variant),*];
        }

        impl $crate::core::State for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }

            fn is_final(&self) -> bool {
                match self {
                    $($(Self::$final => true,)*)?
                    _ => false,
                }
            }

            fn is_error(&self) -> bool {
                match self {
                    $($(Self::$error => true,)*)?
                    _ => false,
                }
            }
        }
    };
}

/// Generate a `Copy` enum and its Event trait implementation.
///
/// # Example
///
/// ```
/// use junction::event_enum;
/// use junction::core::Event;
///
/// event_enum! {
///     pub enum DoorEvent {
///         Push,
///         Pull,
///     }
/// }
///
/// assert_eq!(DoorEvent::Pull.name(), "Pull");
/// ```
#[macro_export]
macro_rules! event_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$(Self::$variant),*];
        }

        impl $crate::core::Event for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{Event, State};

    state_enum! {
        enum TestState {
            Initial,
            Processing,
            Complete,
            Failed,
        }
        final: [Complete, Failed]
        error: [Failed]
    }

    event_enum! {
        enum TestEvent {
            Go,
            Halt,
        }
    }

    #[test]
    fn state_enum_macro_generates_trait() {
        let state = TestState::Initial;
        assert_eq!(state.name(), "Initial");
        assert!(!state.is_final());
        assert!(!state.is_error());

        assert!(TestState::Complete.is_final());
        assert!(!TestState::Complete.is_error());
        assert!(TestState::Failed.is_final());
        assert!(TestState::Failed.is_error());
    }

    #[test]
    fn event_enum_macro_generates_trait() {
        assert_eq!(TestEvent::Halt.name(), "Halt");
        assert_eq!(TestEvent::ALL, &[TestEvent::Go, TestEvent::Halt]);
    }

    #[test]
    fn state_enum_works_without_final_error() {
        state_enum! {
            enum MinimalState {
                One,
                Two,
            }
        }

        assert!(!MinimalState::One.is_final());
        assert!(!MinimalState::Two.is_error());
        assert_eq!(MinimalState::ALL.len(), 2);
    }
}
