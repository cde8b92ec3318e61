use crate::error::UnknownChannelError;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

macro_rules! channel_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident => $wire:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            pub const fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownChannelError;

            fn from_str(channel: &str) -> Result<Self, Self::Err> {
                match channel {
                    $($wire => Ok($name::$variant),)+
                    other => Err(UnknownChannelError {
                        channel: other.to_string(),
                    }),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let channel = String::deserialize(deserializer)?;
                channel.parse().map_err(D::Error::custom)
            }
        }
    };
}

channel_enum! {
    /// Request/response channels (UI `invoke` → main `handle`).
    RpcChannel {
        DirectoryChooser => "directory-chooser",
        ShowMessageBox => "show-message-box",
        ShowSaveDialog => "show-save-dialog",
        FetchMetadata => "fetch-metadata",
        CheckOllama => "check-ollama",
        SelectFileOrDirectory => "select-file-or-directory",
        GetBinaryPath => "get-binary-path",
        ReadFile => "read-file",
        WriteFile => "write-file",
        EnsureDirectory => "ensure-directory",
        ListFiles => "list-files",
        GetAllowedExtensions => "get-allowed-extensions",
        SetMenuBarIcon => "set-menu-bar-icon",
        GetMenuBarIconState => "get-menu-bar-icon-state",
        SetDockIcon => "set-dock-icon",
        GetDockIconState => "get-dock-icon-state",
        GetSettings => "get-settings",
        SaveSettings => "save-settings",
        GetSecretKey => "get-secret-key",
        GetGoosedHostPort => "get-goosed-host-port",
        SetWakelock => "set-wakelock",
        GetWakelockState => "get-wakelock-state",
        SetSpellcheck => "set-spellcheck",
        GetSpellcheckState => "get-spellcheck-state",
        OpenNotificationsSettings => "open-notifications-settings",
        OpenExternal => "open-external",
        CheckForUpdates => "check-for-updates",
        DownloadUpdate => "download-update",
        InstallUpdate => "install-update",
        GetUpdateState => "get-update-state",
        IsUsingGithubFallback => "is-using-github-fallback",
        HasAcceptedRecipeBefore => "has-accepted-recipe-before",
        RecordRecipeHash => "record-recipe-hash",
        OpenDirectoryInExplorer => "open-directory-in-explorer",
        AddRecentDir => "add-recent-dir",
        GetCurrentVersion => "get-current-version",
        DesktopGetState => "desktop:get-state",
        DesktopSendLogs => "desktop:send-logs",
        DesktopSendMessage => "desktop:send-message",
    }
}

channel_enum! {
    /// Fire-and-forget channels (UI `send` → main `on`).
    CmdChannel {
        ReactReady => "react-ready",
        HideWindow => "hide-window",
        CreateChatWindow => "create-chat-window",
        LogInfo => "logInfo",
        Notify => "notify",
        OpenInChrome => "open-in-chrome",
        ReloadApp => "reload-app",
        BroadcastThemeChange => "broadcast-theme-change",
        RestartApp => "restart-app",
        CloseWindow => "close-window",
        GetAppVersion => "get-app-version",
    }
}

channel_enum! {
    /// Main → UI push channels.
    EventChannel {
        AddExtension => "add-extension",
        OpenSharedSession => "open-shared-session",
        SetInitialMessage => "set-initial-message",
        FatalError => "fatal-error",
        MouseBackButtonClicked => "mouse-back-button-clicked",
        ThemeChanged => "theme-changed",
        UpdaterEvent => "updater-event",
        SetView => "set-view",
        NewChat => "new-chat",
        FocusInput => "focus-input",
        FindCommand => "find-command",
        FindNext => "find-next",
        FindPrevious => "find-previous",
        UseSelectionFind => "use-selection-find",
    }
}
