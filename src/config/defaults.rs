//! Default configuration values

/// Config file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "relpack.toml";

/// Build metadata file generated by the project's configure step
pub const VERSION_FILE: &str = "Systems/Engine/BuildVersion.inl";

/// Archive file name prefix
pub const ARCHIVE_PREFIX: &str = "Develop";

/// Archive file extension
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Stage timeout in seconds (0 disables the timeout)
pub const STAGE_TIMEOUT_SECS: u64 = 0;

/// Host OS both platforms must be built on
pub const REQUIRED_HOST: &str = "Windows";

/// Visual Studio project generator script
pub const WIN32_GENERATOR: &str = "CMakeBuild/GenerateVS2015.cmd";

/// msbuild executable
pub const MSBUILD_PATH: &str = "C:/Progra~2/MSBuild/14.0/Bin/amd64/msbuild";

/// Solution built by msbuild
pub const WIN32_SOLUTION: &str = "CMakeBuild/VS2015_MSVC_Windows/Zero.sln";

/// msbuild parallelism hint
pub const MSBUILD_MAX_CPU_COUNT: u32 = 8;

/// msbuild configuration
pub const MSBUILD_CONFIGURATION: &str = "Release";

/// Resource tree packaged under `Resources/`
pub const RESOURCES_DIR: &str = "Resources";

/// Data tree packaged under `Data/`
pub const DATA_DIR: &str = "Data";

/// Compiled editor output packaged at the archive root
pub const WIN32_BUILD_OUTPUT: &str = "BuildOutput/Out/Windows_VS_2015/Release/ZeroEditor";

/// Resource folder whose nested subdirectories are left out of the archive
pub const RESOURCE_EXCLUSION_FOLDER: &str = "ZeroLauncherResources";

/// Emscripten SDK version
pub const EMSCRIPTEN_VERSION: &str = "1.38.12";

/// Emscripten SDK root when not configured through the environment
pub const EMSDK_ROOT: &str = "C:/emsdk";

/// Emscripten config file
pub const EM_CONFIG: &str = "C:/Users/appveyor/.emscripten";

/// Node bundle shipped with the SDK
pub const EMSDK_NODE_VERSION: &str = "8.9.1_64bit";

/// Python bundle shipped with the SDK
pub const EMSDK_PYTHON_VERSION: &str = "2.7.13.1_64bit";

/// Python bundle inner directory
pub const EMSDK_PYTHON_DIR: &str = "python-2.7.13.amd64";

/// Java bundle shipped with the SDK
pub const EMSDK_JAVA_VERSION: &str = "8.152_64bit";

/// Shell executable that breaks mingw32-make when found on PATH
pub const CONFLICTING_SHELL_PATH: &str = "C:/Program Files/Git/usr/bin/sh.exe";

/// File name searched for on PATH
pub const CONFLICTING_SHELL_NAME: &str = "sh.exe";

/// Cross-compiling project generator script
pub const EMSCRIPTEN_GENERATOR: &str = "CMakeBuild/GenerateMingw_Emscripten.cmd";

/// emmake wrapper
pub const EMMAKE_PROGRAM: &str = "emmake";

/// make program run through emmake
pub const MAKE_PROGRAM: &str = "mingw32-make";

/// Directory containing the generated makefiles
pub const EMSCRIPTEN_MAKE_DIR: &str = "CMakeBuild/Mingw_Emscripten";

/// Single file packaged for the web build
pub const EMSCRIPTEN_OUTPUT_FILE: &str = "BuildOutput/Out/Emscripten/Debug/ZeroEditor/ZeroEditor.html";

/// Minimum proptest iterations
pub const MIN_PROPTEST_ITERATIONS: u32 = 100;
