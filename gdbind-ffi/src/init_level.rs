/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Step in the engine's initialization process.
///
/// Initialization is split into stages, like a stack. At each level a different amount of engine functionality is
/// available; method tables of a class are resolved at the level its class belongs to. Deinitialization happens in
/// reverse order.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum InitLevel {
    /// First level loaded by the engine. Builtin types and core classes are available.
    Core,

    /// Second level. Only server classes and builtins are available.
    Servers,

    /// Third level. Most classes are available.
    Scene,

    /// Fourth level, only in the editor. All classes are available.
    Editor,
}

impl InitLevel {
    pub const ALL: [InitLevel; 4] = [Self::Core, Self::Servers, Self::Scene, Self::Editor];

    #[doc(hidden)]
    pub fn from_sys(level: crate::GDExtensionInitializationLevel) -> Self {
        match level {
            crate::GDEXTENSION_INITIALIZATION_CORE => Self::Core,
            crate::GDEXTENSION_INITIALIZATION_SERVERS => Self::Servers,
            crate::GDEXTENSION_INITIALIZATION_SCENE => Self::Scene,
            crate::GDEXTENSION_INITIALIZATION_EDITOR => Self::Editor,
            _ => {
                eprintln!("WARNING: unknown initialization level {level}");
                Self::Scene
            }
        }
    }

    #[doc(hidden)]
    pub fn to_sys(self) -> crate::GDExtensionInitializationLevel {
        match self {
            Self::Core => crate::GDEXTENSION_INITIALIZATION_CORE,
            Self::Servers => crate::GDEXTENSION_INITIALIZATION_SERVERS,
            Self::Scene => crate::GDEXTENSION_INITIALIZATION_SCENE,
            Self::Editor => crate::GDEXTENSION_INITIALIZATION_EDITOR,
        }
    }

    /// Levels from `Core` up to and including `self`.
    pub fn up_to(self) -> impl Iterator<Item = InitLevel> {
        Self::ALL.into_iter().filter(move |level| *level <= self)
    }
}

#[cfg(test)]
mod tests {
    use super::InitLevel;

    #[test]
    fn sys_roundtrip() {
        for level in InitLevel::ALL {
            assert_eq!(InitLevel::from_sys(level.to_sys()), level);
        }
    }

    #[test]
    fn levels_up_to() {
        let levels: Vec<_> = InitLevel::Scene.up_to().collect();
        assert_eq!(levels, [InitLevel::Core, InitLevel::Servers, InitLevel::Scene]);
    }
}
