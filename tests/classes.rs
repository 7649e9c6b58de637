mod common;

use common::{error, output};

const DIAMOND: &str = "
class A { fun who(self) { return \"A\" } }
class B inherits A { fun who(self) { return \"B\" + super.who() } }
class C inherits A { fun who(self) { return \"C\" + super.who() } }
class D inherits B, C { fun who(self) { return \"D\" + super.who() } }
";

#[test]
fn diamond_mro_is_c3() {
    let printed = output(&format!("{}\nprint(D.mro)\nprint(D.name)", DIAMOND));

    assert_eq!(
        printed,
        "[<class 'D'>, <class 'B'>, <class 'C'>, <class 'A'>]\nD\n"
    );
}

#[test]
fn super_follows_the_instance_mro() {
    let printed = output(&format!("{}\nprint(D().who())\nprint(B().who())", DIAMOND));

    assert_eq!(printed, "DBCA\nBA\n");
}

#[test]
fn first_class_in_mro_wins_method_lookup() {
    let printed = output(
        "class A { fun who(self) { return \"A\" } }
         class B inherits A { fun who(self) { return \"B\" } }
         class C inherits A { fun who(self) { return \"C\" } }
         class D inherits C, B { }
         print(D().who())",
    );

    assert_eq!(printed, "C\n");
}

#[test]
fn inconsistent_hierarchies_are_rejected() {
    let err = error(
        "class X { }
class Y { }
class A inherits X, Y { }
class B inherits Y, X { }
class Z inherits A, B { }",
    );

    let message = err.to_string();
    assert!(message.starts_with("Runtime Error on line 5: Cannot create a consistent method resolution order"), "{}", message);
    assert!(message.contains("'Z'"));
}

#[test]
fn parents_must_be_classes() {
    let err = error("x = 1\nclass K inherits x { }");

    assert_eq!(
        err.to_string(),
        "Runtime Error on line 2: 'inherits' must be followed by a class name, got 'int'"
    );
}

#[test]
fn instances_have_independent_fields() {
    let printed = output(
        "class P {
           fun init(self, x) { self.x = x }
           fun get(self) { return self.x }
         }
         a = P(1)
         b = P(2)
         a.x = 10
         print(a.x, b.x)
         print(a.get(), b.get())
         print(a)",
    );

    assert_eq!(printed, "10 2\n10 2\n<P instance>\n");
}

#[test]
fn init_is_inherited_and_takes_keywords() {
    let printed = output(
        "class P { fun init(self, x, y=0) { self.total = x + y } }
         class Q inherits P { }
         print(Q(5).total, Q(y=2, x=1).total)",
    );

    assert_eq!(printed, "5 3\n");
}

#[test]
fn super_init_chains_constructors() {
    let printed = output(
        "class Base { fun init(self, name) { self.name = name } }
         class Child inherits Base {
           fun init(self, name, age) {
             super().init(name)
             self.age = age
           }
         }
         c = Child(\"ada\", 36)
         print(c.name, c.age)",
    );

    assert_eq!(printed, "ada 36\n");
}

#[test]
fn classes_without_init_reject_arguments() {
    let err = error("class E { }\nE(1, 2)");

    assert_eq!(
        err.to_string(),
        "Runtime Error on line 2: 'E' constructor takes no arguments, but 2 were given."
    );
}

#[test]
fn missing_attributes_name_the_class() {
    let err = error("class P { }\np = P()\np.nope");

    assert_eq!(
        err.to_string(),
        "Runtime Error on line 3: Object of type 'P' has no attribute or method 'nope'"
    );
}

#[test]
fn bound_methods_remember_their_receiver() {
    let printed = output(
        "class Counter {
           fun init(self) { self.n = 0 }
           fun bump(self, by=1) {
             self.n = self.n + by
             return self.n
           }
         }
         c = Counter()
         inc = c.bump
         inc()
         inc(by=5)
         print(c.n, inc)",
    );

    assert_eq!(printed, "6 <bound method Counter.bump>\n");
}

#[test]
fn methods_can_be_called_through_the_class() {
    let printed = output(
        "class P { fun hello(self, who) { return \"hi \" + who } }
         print(P.hello(P(), \"there\"))",
    );

    assert_eq!(printed, "hi there\n");
}

#[test]
fn methods_need_a_receiver_parameter() {
    let err = error("class W { fun m() { return 1 } }\nW().m()");

    assert!(err.to_string().ends_with("Function 'm' has no 'self' parameter"), "{}", err);
}

#[test]
fn super_outside_a_method_fails() {
    let err = error("super.who()");

    assert_eq!(
        err.to_string(),
        "Runtime Error on line 1: 'super' can only be used inside a class method."
    );
}

#[test]
fn super_at_the_root_of_the_mro_fails() {
    let err = error("class A { fun m(self) { return super.m() } }\nA().m()");

    assert!(err
        .to_string()
        .contains("'super' could not find a valid superclass in the MRO for class 'A'."));
}

#[test]
fn super_reports_missing_methods() {
    let err = error(
        "class A { }
         class B inherits A { fun m(self) { return super.zzz() } }
         B().m()",
    );

    assert!(err.to_string().contains("No method 'zzz' found in superclass chain."));
}

#[test]
fn user_context_managers_run_exit_on_every_path() {
    let printed = output(
        "class Ctx {
           fun enter(self) { print(\"in\") }
           fun exit(self) { print(\"out\") }
         }
         with Ctx() { print(\"body\") }
         try {
           with Ctx() { throw \"boom\" }
         } catch (e) {
           print(e)
         }",
    );

    assert_eq!(printed, "in\nbody\nout\nin\nout\nboom\n");
}
