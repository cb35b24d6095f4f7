// src/deps/mappings.rs

//! Curated Debian → Arch package name tables
//!
//! These seed [`MappingTables::default`](super::MappingTables). Debian splits
//! libraries into soname-versioned packages (`libssl3`, `libpng16-16`) while
//! Arch ships one package per upstream project, so most entries collapse a
//! versioned library name onto its project name.

/// Direct name equivalences
pub const NAME_MAPPINGS: &[(&str, &str)] = &[
    // Core system libraries
    ("libc6", "glibc"),
    ("libgcc-s1", "gcc-libs"),
    ("libstdc++6", "gcc-libs"),
    ("libssl3", "openssl"),
    ("libgnutls30", "gnutls"),
    // Compression
    ("zlib1g", "zlib"),
    ("libbz2-1.0", "bzip2"),
    ("liblzma5", "xz"),
    ("liblz4-1", "lz4"),
    ("libzstd1", "zstd"),
    // Networking
    ("libcurl4", "curl"),
    ("libssh2-1", "libssh2"),
    ("libnghttp2-14", "libnghttp2"),
    // Python
    ("python3", "python"),
    ("python3-dev", "python"),
    ("python3-pip", "python-pip"),
    ("python3-venv", "python"),
    ("python3-setuptools", "python-setuptools"),
    ("python3-wheel", "python-wheel"),
    ("libpython3.11", "python"),
    ("libperl5.36", "perl"),
    ("libruby3.1", "ruby"),
    // X11 and graphics
    ("libgl1", "libglvnd"),
    ("libx11-6", "libx11"),
    ("libxext6", "libxext"),
    ("libxi6", "libxi"),
    ("libxrender1", "libxrender"),
    ("libxtst6", "libxtst"),
    ("libpng16-16", "libpng"),
    ("libjpeg62-turbo", "libjpeg-turbo"),
    ("libwebp7", "libwebp"),
    // Audio, fonts, system services
    ("libasound2", "alsa-lib"),
    ("libfreetype6", "freetype2"),
    ("libfontconfig1", "fontconfig"),
    ("libexpat1", "expat"),
    ("libdbus-1-3", "dbus"),
    ("libsystemd0", "systemd-libs"),
    ("libudev1", "systemd-libs"),
    // Data formats and databases
    ("libsqlite3-0", "sqlite"),
    ("libxml2", "libxml2"),
    ("libxslt1.1", "libxslt"),
    ("libyaml-0-2", "libyaml"),
    ("libpcre2-8-0", "pcre2"),
    ("libpq5", "postgresql-libs"),
    ("libmysqlclient21", "mariadb-libs"),
    // Terminal
    ("libncurses5", "ncurses"),
    ("libncurses6", "ncurses"),
    ("libtinfo5", "ncurses"),
    ("libtinfo6", "ncurses"),
    ("libreadline8", "readline"),
    ("libffi8", "libffi"),
    // Toolkits
    ("libglib2.0-0", "glib2"),
    ("libgtk-3-0", "gtk3"),
    ("libgdk-pixbuf2.0-0", "gdk-pixbuf2"),
    ("libpango-1.0-0", "pango"),
    ("libcairo2", "cairo"),
    ("libqt5core5a", "qt5-base"),
    ("libqt5gui5", "qt5-base"),
    ("libqt5widgets5", "qt5-base"),
    ("libwayland-client0", "wayland"),
    ("libwayland-cursor0", "wayland"),
    ("libwayland-egl1", "wayland"),
    // Numerics
    ("libfftw3-3", "fftw"),
    ("liblapack3", "lapack"),
    // Same name on both sides
    ("curl", "curl"),
    ("wget", "wget"),
    ("git", "git"),
    ("make", "make"),
    ("gcc", "gcc"),
];

/// Debian virtual packages and the Arch packages that can satisfy them,
/// preferred first
pub const VIRTUAL_MAPPINGS: &[(&str, &[&str])] = &[
    ("www-browser", &["firefox", "chromium", "lynx"]),
    (
        "x-terminal-emulator",
        &["gnome-terminal", "alacritty", "kitty", "xterm"],
    ),
    ("editor", &["vim", "nano", "vi"]),
    ("x-window-manager", &["openbox", "i3-wm", "xfwm4"]),
    ("mail-transport-agent", &["postfix", "opensmtpd"]),
    ("awk", &["gawk"]),
];

/// Debian packaging machinery with no Arch counterpart
///
/// Declaring these on the Arch side would make the package uninstallable,
/// so they are dropped without a warning.
pub const SKIPPED_PACKAGES: &[&str] = &[
    "dpkg",
    "debconf",
    "debconf-2.0",
    "cdebconf",
    "install-info",
    "lsb-base",
    "init-system-helpers",
    "sysvinit-utils",
    "dpkg-dev",
    "debianutils",
    "ucf",
];
