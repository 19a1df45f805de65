//! Well-known standard library signatures.
//!
//! The oracle only indexes the package being processed; calls into other
//! packages are typed through these tables, keyed by import path.

use phf::{phf_map, phf_set};

use super::TypeCategory;

/// Result types of common fallible library functions.
static FUNCTION_RESULTS: phf::Map<&'static str, &'static [&'static str]> = phf_map! {
    "errors.New" => &["error"],
    "errors.Join" => &["error"],
    "errors.Unwrap" => &["error"],
    "fmt.Errorf" => &["error"],
    "fmt.Sprintf" => &["string"],
    "fmt.Println" => &["int", "error"],
    "fmt.Printf" => &["int", "error"],
    "fmt.Fprintf" => &["int", "error"],
    "fmt.Sscanf" => &["int", "error"],
    "os.Open" => &["*os.File", "error"],
    "os.Create" => &["*os.File", "error"],
    "os.OpenFile" => &["*os.File", "error"],
    "os.ReadFile" => &["[]byte", "error"],
    "os.WriteFile" => &["error"],
    "os.ReadDir" => &["[]os.DirEntry", "error"],
    "os.Stat" => &["os.FileInfo", "error"],
    "os.Lstat" => &["os.FileInfo", "error"],
    "os.Mkdir" => &["error"],
    "os.MkdirAll" => &["error"],
    "os.MkdirTemp" => &["string", "error"],
    "os.Remove" => &["error"],
    "os.RemoveAll" => &["error"],
    "os.Rename" => &["error"],
    "os.Getwd" => &["string", "error"],
    "os.Hostname" => &["string", "error"],
    "os.Getenv" => &["string"],
    "io.ReadAll" => &["[]byte", "error"],
    "io.Copy" => &["int64", "error"],
    "io.WriteString" => &["int", "error"],
    "strconv.Atoi" => &["int", "error"],
    "strconv.Itoa" => &["string"],
    "strconv.ParseInt" => &["int64", "error"],
    "strconv.ParseUint" => &["uint64", "error"],
    "strconv.ParseFloat" => &["float64", "error"],
    "strconv.ParseBool" => &["bool", "error"],
    "strconv.Unquote" => &["string", "error"],
    "encoding/json.Marshal" => &["[]byte", "error"],
    "encoding/json.MarshalIndent" => &["[]byte", "error"],
    "encoding/json.Unmarshal" => &["error"],
    "encoding/hex.DecodeString" => &["[]byte", "error"],
    "encoding/base64.StdEncoding.DecodeString" => &["[]byte", "error"],
    "path/filepath.Abs" => &["string", "error"],
    "path/filepath.Rel" => &["string", "error"],
    "path/filepath.Glob" => &["[]string", "error"],
    "path/filepath.EvalSymlinks" => &["string", "error"],
    "net/http.Get" => &["*http.Response", "error"],
    "net/http.Post" => &["*http.Response", "error"],
    "net/http.NewRequest" => &["*http.Request", "error"],
    "net/url.Parse" => &["*url.URL", "error"],
    "net.Dial" => &["net.Conn", "error"],
    "net.Listen" => &["net.Listener", "error"],
    "time.Parse" => &["time.Time", "error"],
    "time.ParseDuration" => &["time.Duration", "error"],
    "time.LoadLocation" => &["*time.Location", "error"],
    "time.Now" => &["time.Time"],
    "regexp.Compile" => &["*regexp.Regexp", "error"],
    "os/exec.LookPath" => &["string", "error"],
    "database/sql.Open" => &["*sql.DB", "error"],
};

/// Types of well-known package-level variables.
static PACKAGE_VARS: phf::Map<&'static str, &'static str> = phf_map! {
    "io.EOF" => "error",
    "io.ErrUnexpectedEOF" => "error",
    "os.ErrNotExist" => "error",
    "os.ErrExist" => "error",
    "os.ErrPermission" => "error",
    "os.Args" => "[]string",
    "context.Canceled" => "error",
    "context.DeadlineExceeded" => "error",
    "database/sql.ErrNoRows" => "error",
    "net/http.ErrServerClosed" => "error",
};

/// Categories of well-known named library types.
static QUALIFIED_TYPES: phf::Map<&'static str, TypeCategory> = phf_map! {
    "time.Duration" => TypeCategory::Integer,
    "time.Month" => TypeCategory::Integer,
    "time.Weekday" => TypeCategory::Integer,
    "time.Time" => TypeCategory::Aggregate { comparable: true },
    "os.FileMode" => TypeCategory::Integer,
    "io/fs.FileMode" => TypeCategory::Integer,
    "os.FileInfo" => TypeCategory::Nilable,
    "io/fs.FileInfo" => TypeCategory::Nilable,
    "os.DirEntry" => TypeCategory::Nilable,
    "context.Context" => TypeCategory::Nilable,
    "context.CancelFunc" => TypeCategory::Nilable,
    "io.Reader" => TypeCategory::Nilable,
    "io.Writer" => TypeCategory::Nilable,
    "io.ReadCloser" => TypeCategory::Nilable,
    "io.WriteCloser" => TypeCategory::Nilable,
    "io.ReadWriter" => TypeCategory::Nilable,
    "io.Closer" => TypeCategory::Nilable,
    "net.Conn" => TypeCategory::Nilable,
    "net.Listener" => TypeCategory::Nilable,
    "net/http.Handler" => TypeCategory::Nilable,
    "net/http.HandlerFunc" => TypeCategory::Nilable,
    "net/http.Header" => TypeCategory::Nilable,
    "net/url.Values" => TypeCategory::Nilable,
    "sync.Mutex" => TypeCategory::Aggregate { comparable: true },
    "sync.RWMutex" => TypeCategory::Aggregate { comparable: true },
    "sync.WaitGroup" => TypeCategory::Aggregate { comparable: true },
    "strings.Builder" => TypeCategory::Aggregate { comparable: true },
    "bytes.Buffer" => TypeCategory::Aggregate { comparable: true },
    "encoding/json.RawMessage" => TypeCategory::Nilable,
    "math/big.Int" => TypeCategory::Aggregate { comparable: true },
};

/// Library error types (implement `error` through pointer receivers).
static ERROR_TYPES: phf::Set<&'static str> = phf_set! {
    "os.PathError",
    "io/fs.PathError",
    "os.LinkError",
    "os.SyscallError",
    "net.OpError",
    "net/url.Error",
    "encoding/json.SyntaxError",
    "encoding/json.UnmarshalTypeError",
    "strconv.NumError",
    "os/exec.ExitError",
};

/// Library constraints whose type sets are all comparable.
static COMPARABLE_CONSTRAINTS: phf::Set<&'static str> = phf_set! {
    "cmp.Ordered",
    "golang.org/x/exp/constraints.Ordered",
    "golang.org/x/exp/constraints.Integer",
    "golang.org/x/exp/constraints.Signed",
    "golang.org/x/exp/constraints.Unsigned",
    "golang.org/x/exp/constraints.Float",
    "golang.org/x/exp/constraints.Complex",
};

/// Category of a predeclared type name.
pub fn builtin_category(name: &str) -> Option<TypeCategory> {
    let category = match name {
        "string" => TypeCategory::String,
        "bool" => TypeCategory::Bool,
        "float32" | "float64" => TypeCategory::Float,
        "complex64" | "complex128" => TypeCategory::Complex,
        "error" | "any" => TypeCategory::Nilable,
        "int" | "int8" | "int16" | "int32" | "int64" | "uint" | "uint8" | "uint16" | "uint32"
        | "uint64" | "uintptr" | "byte" | "rune" => TypeCategory::Integer,
        _ => return None,
    };
    Some(category)
}

/// Whether `name` is a predeclared type usable as a conversion.
pub fn is_builtin_type(name: &str) -> bool {
    builtin_category(name).is_some()
}

pub fn function_results(qualified: &str) -> Option<&'static [&'static str]> {
    FUNCTION_RESULTS.get(qualified).copied()
}

pub fn package_var(qualified: &str) -> Option<&'static str> {
    PACKAGE_VARS.get(qualified).copied()
}

pub fn qualified_category(qualified: &str) -> Option<TypeCategory> {
    QUALIFIED_TYPES.get(qualified).cloned()
}

pub fn is_error_type(qualified: &str) -> bool {
    ERROR_TYPES.contains(qualified)
}

pub fn is_comparable_constraint(qualified: &str) -> bool {
    COMPARABLE_CONSTRAINTS.contains(qualified)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_categories() {
        assert_eq!(builtin_category("int"), Some(TypeCategory::Integer));
        assert_eq!(builtin_category("uint16"), Some(TypeCategory::Integer));
        assert_eq!(builtin_category("rune"), Some(TypeCategory::Integer));
        assert_eq!(builtin_category("float64"), Some(TypeCategory::Float));
        assert_eq!(builtin_category("string"), Some(TypeCategory::String));
        assert_eq!(builtin_category("error"), Some(TypeCategory::Nilable));
        assert_eq!(builtin_category("integer"), None);
        assert_eq!(builtin_category("User"), None);
    }

    #[test]
    fn test_tables() {
        assert_eq!(function_results("os.Open"), Some(&["*os.File", "error"][..]));
        assert_eq!(function_results("os.Nope"), None);
        assert_eq!(package_var("io.EOF"), Some("error"));
        assert_eq!(
            qualified_category("time.Duration"),
            Some(TypeCategory::Integer)
        );
        assert!(is_error_type("os.PathError"));
        assert!(is_comparable_constraint("cmp.Ordered"));
    }
}
