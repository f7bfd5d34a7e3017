//! Translation between the caller's control-command vocabulary and the
//! backend's.
//!
//! The caller compiles against two small integers and nothing else. Backend
//! control constants have been observed to differ between platforms and
//! library versions (the reader subsystem had the same problem with its
//! `#define`s), so raw backend values never cross this boundary; this table
//! is the single place the two numeric spaces meet, and a backend that
//! renumbers its codes costs exactly one edit here.

/// Caller value requesting the authentication tag after encryption.
pub const CTRL_GET_TAG: i32 = 16;
/// Caller value supplying the expected tag before the decrypting final.
pub const CTRL_SET_TAG: i32 = 17;

/// Backend control operations reachable through the cipher `ctrl` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagCommand {
    /// Retrieve the computed authentication tag.
    Get,
    /// Supply the tag to verify against.
    Set,
}

/// Translate a caller control command, rejecting everything outside the
/// fixed vocabulary without touching any backend handle.
pub const fn translate(command: i32) -> Option<TagCommand> {
    match command {
        CTRL_GET_TAG => Some(TagCommand::Get),
        CTRL_SET_TAG => Some(TagCommand::Set),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognized_commands_translate() {
        assert_eq!(translate(16), Some(TagCommand::Get));
        assert_eq!(translate(17), Some(TagCommand::Set));
    }

    #[test]
    fn everything_else_is_rejected() {
        for command in -1000..1000 {
            if command == CTRL_GET_TAG || command == CTRL_SET_TAG {
                continue;
            }
            assert_eq!(translate(command), None, "command {command} must be rejected");
        }
        assert_eq!(translate(0), None);
        assert_eq!(translate(i32::MIN), None);
        assert_eq!(translate(i32::MAX), None);
    }
}
